//! Property definition API client

use ucd_models::{NewPropDef, PropDef, PropSheetDef};

use crate::errors::PublisherError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// List the property definitions of a sheet definition
    pub async fn fetch_prop_defs(&self, sheet_def: &PropSheetDef) -> Result<Vec<PropDef>, PublisherError> {
        let path = format!("{}.-1", sheet_def.path);
        let url = self.url(&["property", "propSheetDef", &path, "propDefs"], &[])?;
        self.get(&url, "reading property definitions").await
    }

    /// Create a property definition on a sheet definition
    pub async fn put_prop_def(&self, sheet_def: &PropSheetDef, def: &NewPropDef) -> Result<(), PublisherError> {
        let path = format!("{}.-1", sheet_def.path);
        let url = self.url(&["property", "propSheetDef", &path, "propDefs"], &[])?;
        self.put(&url, Some(def)).await?;
        Ok(())
    }
}
