/// Backend base URL used when none is baked in at build time.
pub const DEFAULT_API_BASE: &str = "/api";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
	pub api_base: String,
}

impl AppConfig {
	/// Reads `GRAPH_API_BASE` from the build environment, else `/api`.
	pub fn load() -> Self {
		Self::with_base(option_env!("GRAPH_API_BASE").unwrap_or(DEFAULT_API_BASE))
	}

	pub fn with_base(base: &str) -> Self {
		let trimmed = base.trim().trim_end_matches('/');
		Self {
			api_base: if trimmed.is_empty() {
				DEFAULT_API_BASE.to_string()
			} else {
				trimmed.to_string()
			},
		}
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		Self::with_base(DEFAULT_API_BASE)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::SimulationConfig;

	#[test]
	fn base_is_normalised() {
		assert_eq!(AppConfig::with_base("http://host:8000/api/").api_base, "http://host:8000/api");
		assert_eq!(AppConfig::with_base("  ").api_base, DEFAULT_API_BASE);
		assert_eq!(AppConfig::default().api_base, "/api");
	}

	#[test]
	fn simulation_config_accepts_partial_overrides() {
		let config: SimulationConfig =
			serde_json::from_value(serde_json::json!({ "charge_strength": -50.0, "drag_alpha": 0.5 }))
				.unwrap();
		assert_eq!(config.charge_strength, -50.0);
		assert_eq!(config.drag_alpha, 0.5);
		assert_eq!(config.link_distance, SimulationConfig::default().link_distance);
	}
}
