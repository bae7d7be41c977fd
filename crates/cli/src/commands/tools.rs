//! `vibeforge tools`: print the catalog the model is offered.

use vibeforge_core::tool::catalog;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    for tool in catalog() {
        println!("{}", tool.name);
        println!("    {}", tool.description);
        println!("    {}", serde_json::to_string(&tool.parameters)?);
    }
    Ok(())
}
