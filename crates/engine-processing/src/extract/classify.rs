use connectors::error::ConnectorError;
use engine_core::retry::RetryDisposition;

/// Maps connector failures onto the retry policy. Only failures the source
/// may recover from on its own are worth re-issuing a batch for.
pub fn classify_connector_error(err: &ConnectorError) -> RetryDisposition {
    match err {
        ConnectorError::ConnectionDropped(_) | ConnectorError::Timeout(_) => {
            RetryDisposition::Retry
        }
        ConnectorError::Auth(_)
        | ConnectorError::MalformedQuery(_)
        | ConnectorError::SchemaMismatch(_)
        | ConnectorError::InvalidDescriptor(_)
        | ConnectorError::Sink(_)
        | ConnectorError::Io(_)
        | ConnectorError::Other(_) => RetryDisposition::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures_are_retried() {
        assert_eq!(
            classify_connector_error(&ConnectorError::Timeout("slow".into())),
            RetryDisposition::Retry
        );
        assert_eq!(
            classify_connector_error(&ConnectorError::ConnectionDropped("reset".into())),
            RetryDisposition::Retry
        );
    }

    #[test]
    fn permanent_failures_stop_immediately() {
        assert_eq!(
            classify_connector_error(&ConnectorError::Auth("denied".into())),
            RetryDisposition::Stop
        );
        assert_eq!(
            classify_connector_error(&ConnectorError::MalformedQuery("syntax".into())),
            RetryDisposition::Stop
        );
    }
}
