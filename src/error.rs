use thiserror::Error;

/// Failures while loading a graph snapshot from the backend.
#[derive(Debug, Error)]
pub enum GraphError {
	#[error("no browser window available")]
	NoWindow,
	#[error("request failed: {0}")]
	Request(String),
	#[error("server responded with HTTP {0}")]
	Status(u16),
	#[error("could not read response body: {0}")]
	Body(String),
	#[error("malformed graph payload: {0}")]
	Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decode_errors_convert_and_display() {
		let err: GraphError = serde_json::from_str::<serde_json::Value>("{")
			.map_err(GraphError::from)
			.unwrap_err();
		assert!(matches!(err, GraphError::Decode(_)));
		assert!(err.to_string().starts_with("malformed graph payload"));
		assert_eq!(GraphError::Status(502).to_string(), "server responded with HTTP 502");
	}
}
