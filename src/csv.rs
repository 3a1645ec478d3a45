use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::amount::AmountError;
use crate::config::Config;
use crate::ledger::AgentEarnings;
use crate::model::{AgentId, Deal, DealType, Event, SplitRecord, TxId};

/// Errors that can occur when reading or writing csv
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized event type '{event_type}'")]
    UnrecognizedType { line: usize, event_type: String },

    #[error("line {line}: unrecognized deal type '{deal_type}'")]
    UnrecognizedDeal { line: usize, deal_type: String },

    #[error("line {line}: {event_type} missing {field}")]
    MissingField {
        line: usize,
        event_type: &'static str,
        field: &'static str,
    },

    #[error("line {line}: invalid {field}: {source}")]
    InvalidValue {
        line: usize,
        field: &'static str,
        source: AmountError,
    },

    #[error("failed to write row: {0}")]
    Write(#[source] csv::Error),

    #[error("failed to flush output: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    tx: TxId,
    #[serde(default)]
    deal: Option<String>,
    #[serde(default)]
    gross: Option<String>,
    #[serde(default)]
    rate: Option<String>,
    #[serde(default)]
    primary: Option<AgentId>,
    #[serde(default)]
    collaborator: Option<AgentId>,
    #[serde(default)]
    split_ratio: Option<String>,
}

#[derive(Debug, Serialize)]
struct SplitRow {
    tx: TxId,
    deal: String,
    gross: String,
    rate: String,
    commission: String,
    office_share: String,
    primary_agent: AgentId,
    primary_share: String,
    collaborating_agent: Option<AgentId>,
    collaborating_share: String,
}

#[derive(Debug, Serialize)]
struct AgentRow {
    agent: AgentId,
    deals: u32,
    as_primary: String,
    as_collaborator: String,
    total: String,
}

/// Read ledger events from a csv file.
///
/// Rows without a `rate` take the configured default for their deal type.
pub fn read_events(
    path: impl AsRef<Path>,
    config: Config,
) -> Result<impl Iterator<Item = Result<Event, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(move |(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row, &config)
        }))
}

fn parse_row(line: usize, row: InputRow, config: &Config) -> Result<Event, CsvError> {
    match row.r#type.as_str() {
        "close" => {
            let deal_type = match require(line, "close", "deal", row.deal)?.as_str() {
                "sale" => DealType::Sale,
                "rent" => DealType::Rent,
                other => {
                    return Err(CsvError::UnrecognizedDeal {
                        line,
                        deal_type: other.to_string(),
                    });
                }
            };
            let gross = parse_field(line, "gross", row.gross)?;
            let gross_amount = require(line, "close", "gross", gross)?;
            let commission_rate =
                parse_field(line, "rate", row.rate)?.unwrap_or_else(|| config.rate_for(deal_type));
            Ok(Event::Close(Deal {
                tx: row.tx,
                deal_type,
                gross_amount,
                commission_rate,
                primary_agent: require(line, "close", "primary", row.primary)?,
                collaborating_agent: row.collaborator,
                split_ratio: parse_field(line, "split_ratio", row.split_ratio)?,
            }))
        }
        "amend" => Ok(Event::Amend {
            tx: row.tx,
            gross_amount: parse_field(line, "gross", row.gross)?,
            commission_rate: parse_field(line, "rate", row.rate)?,
        }),
        "cancel" => Ok(Event::Cancel { tx: row.tx }),
        other => Err(CsvError::UnrecognizedType {
            line,
            event_type: other.to_string(),
        }),
    }
}

fn require<T>(
    line: usize,
    event_type: &'static str,
    field: &'static str,
    value: Option<T>,
) -> Result<T, CsvError> {
    value.ok_or(CsvError::MissingField {
        line,
        event_type,
        field,
    })
}

fn parse_field<T>(
    line: usize,
    field: &'static str,
    value: Option<String>,
) -> Result<Option<T>, CsvError>
where
    T: FromStr<Err = AmountError>,
{
    value
        .map(|v| {
            v.parse()
                .map_err(|source| CsvError::InvalidValue { line, field, source })
        })
        .transpose()
}

/// Write split records in csv format
pub fn write_splits<'a>(
    writer: impl io::Write,
    records: impl IntoIterator<Item = &'a SplitRecord>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for record in records {
        let deal = &record.deal;
        let row = SplitRow {
            tx: deal.tx,
            deal: deal.deal_type.to_string(),
            gross: deal.gross_amount.to_string(),
            rate: deal.commission_rate.to_string(),
            commission: record.commission_amount.to_string(),
            office_share: record.split.office_share.to_string(),
            primary_agent: deal.primary_agent,
            primary_share: record.split.primary_agent_share.to_string(),
            collaborating_agent: deal.collaborating_agent,
            collaborating_share: record.split.collaborating_agent_share.to_string(),
        };
        writer.serialize(&row).map_err(CsvError::Write)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write agent earnings in csv format
pub fn write_agents<'a>(
    writer: impl io::Write,
    agents: impl IntoIterator<Item = &'a AgentEarnings>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for agent in agents {
        let row = AgentRow {
            agent: agent.agent,
            deals: agent.deals,
            as_primary: agent.as_primary.to_string(),
            as_collaborator: agent.as_collaborator.to_string(),
            total: agent.total().to_string(),
        };
        writer.serialize(&row).map_err(CsvError::Write)?;
    }

    writer.flush()?;
    Ok(())
}
