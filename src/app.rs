//! Tracked applications and the cache filenames derived from them

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Base of the Steam Web API item schema endpoint.
pub const API_BASE: &str = "http://api.steampowered.com";

/// Namespace prefix for generated schema types.
pub const GENERATED_NAMESPACE: &str = "steam_econ::schema";

/// The kind of file a tracked app produces.
///
/// Declaration order is the order change messages are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// `schema_<id>.json`, the cached `result` object of GetSchema
    PrimarySchema,
    /// `clientschema_<id>.vdf`, the raw document behind `items_game_url`
    SecondarySchema,
    /// `<ShortCode>Schema.rs`, generated from the primary schema
    GeneratedArtifact,
}

impl ResourceKind {
    /// All kinds, in message order.
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::PrimarySchema,
        ResourceKind::SecondarySchema,
        ResourceKind::GeneratedArtifact,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::PrimarySchema => "PrimarySchema",
            ResourceKind::SecondarySchema => "SecondarySchema",
            ResourceKind::GeneratedArtifact => "GeneratedArtifact",
        };
        f.write_str(name)
    }
}

/// One Steam application whose item schema is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EconApp {
    /// Steam app id
    pub id: u32,
    /// Display name used in commit messages
    pub name: String,
    /// Short code the generated type is named after (e.g. `TF2`)
    pub short_code: String,
}

impl EconApp {
    pub fn new(id: u32, name: &str, short_code: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            short_code: short_code.to_string(),
        }
    }

    /// Name of the cached primary schema file.
    pub fn schema_file_name(&self) -> String {
        format!("schema_{}.json", self.id)
    }

    /// Name of the cached client schema file.
    pub fn client_schema_file_name(&self) -> String {
        format!("clientschema_{}.vdf", self.id)
    }

    /// Name of the generated type, e.g. `TF2Schema`.
    pub fn type_name(&self) -> String {
        format!("{}Schema", self.short_code)
    }

    /// Name of the generated source file.
    pub fn artifact_file_name(&self) -> String {
        format!("{}.rs", self.type_name())
    }

    /// Namespace token handed to the artifact generator.
    pub fn namespace(&self) -> String {
        format!("{}::{}", GENERATED_NAMESPACE, self.type_name())
    }

    /// Derived filename for the given resource kind.
    pub fn file_name(&self, kind: ResourceKind) -> String {
        match kind {
            ResourceKind::PrimarySchema => self.schema_file_name(),
            ResourceKind::SecondarySchema => self.client_schema_file_name(),
            ResourceKind::GeneratedArtifact => self.artifact_file_name(),
        }
    }

    /// GetSchema URL for this app.
    pub fn schema_url(&self, api_key: &str, language: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/IEconItems_{}/GetSchema/v1/",
            API_BASE, self.id
        ))?;
        url.query_pairs_mut()
            .append_pair("key", api_key)
            .append_pair("language", language);
        Ok(url)
    }
}

impl fmt::Display for EconApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// The built-in set of tracked apps.
pub fn default_apps() -> Vec<EconApp> {
    vec![
        EconApp::new(440, "Team Fortress 2", "TF2"),
        EconApp::new(570, "Dota 2", "Dota2"),
        EconApp::new(620, "Portal 2", "Portal2"),
        EconApp::new(730, "Counter-Strike: Global Offensive", "CSGO"),
        EconApp::new(816, "Dota 2 Internal Test", "Dota2InternalTest"),
        EconApp::new(841, "Portal 2 Beta", "Portal2Beta"),
        EconApp::new(205790, "Dota 2 (Beta) Test", "Dota2BetaTest"),
    ]
}
