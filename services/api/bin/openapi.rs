use clap::Parser;
use techsupport_api::router::api_doc;

#[derive(Parser, Debug)]
#[command(version, about = "Write the OpenAPI document of the support API")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "openapi.json")]
    output: String,

    /// Route the API is served under
    #[arg(short, long, default_value = "/support")]
    route: String,
}

/// Writes the OpenAPI document to a file.
fn write_openapi(
    doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, doc.to_pretty_json()?)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    write_openapi(api_doc(&args.route), &args.output)?;
    println!("OpenAPI document written to {}", args.output);
    Ok(())
}
