use crate::api::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MAX_COLLECTIONS: usize = 10;
const MAX_ERROR_CHARS: usize = 50;
pub const NOT_INITIALIZED: &str = "⚠️  Available but not initialized";

/// Body of `GET /test`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostics {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn presence(set: bool) -> String {
    let status = if set { "✅ Set" } else { "❌ Not Set" };
    status.to_string()
}

/// Store health as data; this endpoint never fails.
pub async fn check(State(state): State<AppState>) -> Json<Diagnostics> {
    let mut report = Diagnostics {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        database_url: presence(state.config.database_url.is_some()),
        database_name: presence(state.config.database_name.is_some()),
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    if let Some(store) = &state.store {
        report.connection_status = "Connected".to_string();
        match store.collection_names().await {
            Ok(names) => {
                report.collections = names.into_iter().take(MAX_COLLECTIONS).collect();
                report.database = format!("✅ Connected & Working ({})", store.database_name());
            }
            Err(e) => {
                warn!("Diagnostic collection listing failed: {}", e);
                report.database = format!(
                    "⚠️  Connected but Error: {}",
                    truncate(&e.to_string(), MAX_ERROR_CHARS)
                );
            }
        }
    } else {
        report.database = NOT_INITIALIZED.to_string();
    }

    Json(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_characters() {
        assert_eq!(truncate("ümlaut-heavy", 3), "üml");
        assert_eq!(truncate("short", 50), "short");
    }
}
