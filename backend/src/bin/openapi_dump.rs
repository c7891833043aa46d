//! Print the OpenAPI document as JSON.

use color_eyre::eyre::Result;
use medminder::doc::ApiDoc;
use utoipa::OpenApi;

#[expect(clippy::print_stdout, reason = "the JSON document is the program output")]
fn main() -> Result<()> {
    color_eyre::install()?;
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
