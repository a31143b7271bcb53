use common::error::ValidatorError;
use shared_clients::default_registry;

/// Prints `<alias>\t<connector.class>` per registered connector type.
pub fn handle_connectors() -> Result<(), ValidatorError> {
    let registry = default_registry().map_err(|e| ValidatorError::Init(Box::new(e)))?;
    for connector in registry.iter() {
        let definition = connector.definition();
        println!("{}\t{}", definition.alias(), definition.connector_class());
    }
    Ok(())
}
