use crate::{error::ConnectorError, executor::QueryExecutor, query::QueryParams};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::{
        data_type::DataType,
        value::{FieldValue, Value},
    },
    records::row::RowData,
};
use tokio_postgres::{Client, Config, NoTls, Row, error::SqlState, types::Type};
use tracing::error;

/// Reference [`QueryExecutor`] over a single tokio-postgres client, shared
/// across source-runs. Connection pooling is the caller's concern; the
/// engine only requires that errors are classified as transient or
/// permanent.
pub struct PostgresExecutor {
    client: Client,
}

impl PostgresExecutor {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let config = url
            .parse::<Config>()
            .map_err(|e| ConnectorError::InvalidDescriptor(e.to_string()))?;
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(classify_pg_error)?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(%err, "Postgres connection error");
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn execute(
        &self,
        query: &str,
        _params: &QueryParams,
    ) -> Result<Vec<RowData>, ConnectorError> {
        let rows = self
            .client
            .query(query, &[])
            .await
            .map_err(classify_pg_error)?;

        Ok(rows.iter().map(row_to_row_data).collect())
    }
}

/// Rows leave the executor unlabeled; the extraction engine stamps them
/// with the source name.
fn row_to_row_data(row: &Row) -> RowData {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let (value, data_type) = decode_column(row, idx, col.type_());
            FieldValue {
                name: col.name().to_string(),
                value,
                data_type,
            }
        })
        .collect();

    RowData::new("", fields)
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> (Option<Value>, DataType) {
    match *ty {
        Type::BOOL => (
            row.try_get::<_, Option<bool>>(idx)
                .ok()
                .flatten()
                .map(Value::Boolean),
            DataType::Boolean,
        ),
        Type::INT2 => (
            row.try_get::<_, Option<i16>>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Int(v as i64)),
            DataType::Int,
        ),
        Type::INT4 => (
            row.try_get::<_, Option<i32>>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Int(v as i64)),
            DataType::Int,
        ),
        Type::INT8 => (
            row.try_get::<_, Option<i64>>(idx)
                .ok()
                .flatten()
                .map(Value::Int),
            DataType::Int,
        ),
        Type::FLOAT4 => (
            row.try_get::<_, Option<f32>>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Float(v as f64)),
            DataType::Float,
        ),
        Type::FLOAT8 => (
            row.try_get::<_, Option<f64>>(idx)
                .ok()
                .flatten()
                .map(Value::Float),
            DataType::Float,
        ),
        Type::DATE => (
            row.try_get::<_, Option<NaiveDate>>(idx)
                .ok()
                .flatten()
                .map(Value::Date),
            DataType::Date,
        ),
        Type::TIMESTAMP => (
            row.try_get::<_, Option<NaiveDateTime>>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Timestamp(v.and_utc())),
            DataType::Timestamp,
        ),
        Type::TIMESTAMPTZ => (
            row.try_get::<_, Option<DateTime<Utc>>>(idx)
                .ok()
                .flatten()
                .map(Value::Timestamp),
            DataType::Timestamp,
        ),
        Type::UUID => (
            row.try_get::<_, Option<uuid::Uuid>>(idx)
                .ok()
                .flatten()
                .map(Value::Uuid),
            DataType::Uuid,
        ),
        Type::JSON | Type::JSONB => (
            row.try_get::<_, Option<serde_json::Value>>(idx)
                .ok()
                .flatten()
                .map(Value::Json),
            DataType::Json,
        ),
        // Everything else is surfaced textually and left to coercion.
        _ => (
            row.try_get::<_, Option<String>>(idx)
                .ok()
                .flatten()
                .map(Value::String),
            DataType::String,
        ),
    }
}

/// Maps driver errors into the engine taxonomy. Connection-level failures
/// and the usual transient SQLSTATEs are retryable; auth and query-shape
/// errors are permanent.
pub fn classify_pg_error(err: tokio_postgres::Error) -> ConnectorError {
    if err.is_closed() {
        return ConnectorError::ConnectionDropped(err.to_string());
    }

    let Some(code) = err.code() else {
        return ConnectorError::ConnectionDropped(err.to_string());
    };

    if *code == SqlState::QUERY_CANCELED {
        return ConnectorError::Timeout(err.to_string());
    }

    if is_retryable_pg_code(code) {
        return ConnectorError::ConnectionDropped(err.to_string());
    }

    if matches!(
        *code,
        SqlState::INVALID_AUTHORIZATION_SPECIFICATION | SqlState::INVALID_PASSWORD
    ) {
        return ConnectorError::Auth(err.to_string());
    }

    if matches!(
        *code,
        SqlState::UNDEFINED_TABLE | SqlState::UNDEFINED_COLUMN | SqlState::DATATYPE_MISMATCH
    ) {
        return ConnectorError::SchemaMismatch(err.to_string());
    }

    if code.code().starts_with("42") {
        return ConnectorError::MalformedQuery(err.to_string());
    }

    ConnectorError::Other(err.to_string())
}

fn is_retryable_pg_code(code: &SqlState) -> bool {
    matches!(
        *code,
        SqlState::T_R_SERIALIZATION_FAILURE
            | SqlState::T_R_DEADLOCK_DETECTED
            | SqlState::LOCK_NOT_AVAILABLE
            | SqlState::TOO_MANY_CONNECTIONS
            | SqlState::ADMIN_SHUTDOWN
            | SqlState::CRASH_SHUTDOWN
            | SqlState::CANNOT_CONNECT_NOW
            | SqlState::CONNECTION_FAILURE
            | SqlState::CONNECTION_DOES_NOT_EXIST
            | SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION
            | SqlState::SQLSERVER_REJECTED_ESTABLISHMENT_OF_SQLCONNECTION
            | SqlState::CONNECTION_EXCEPTION
            | SqlState::OPERATOR_INTERVENTION
    )
}
