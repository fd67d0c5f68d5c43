//! Transfer pairing rules.
//!
//! A transfer id must resolve to exactly two rows: one `outgoing` leg under
//! an expense category and one `incoming` leg under an income category, both
//! with the same amount. Anything else is refused as corrupted.

use uuid::Uuid;

use crate::{Direction, EngineError, ResultEngine, TransferRole, transactions};

/// A stored leg together with the direction of its category.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LegRow {
    pub(crate) model: transactions::Model,
    pub(crate) direction: Direction,
}

/// Both legs of a verified transfer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TransferPair {
    pub(crate) transfer_id: Uuid,
    pub(crate) outgoing: LegRow,
    pub(crate) incoming: LegRow,
}

/// The direction a leg's category must have.
pub(crate) fn required_direction(role: TransferRole) -> Direction {
    match role {
        TransferRole::Outgoing => Direction::Expense,
        TransferRole::Incoming => Direction::Income,
    }
}

/// Description of the incoming leg, derived from the source account name and
/// the transfer's base description.
pub(crate) fn incoming_description(from_account: &str, base: Option<&str>) -> String {
    match base {
        Some(base) => format!("Transfer from {from_account}: {base}"),
        None => format!("Transfer from {from_account}"),
    }
}

/// Inverse of [`incoming_description`] for text written through the incoming
/// leg: drops the `Transfer from {from_account}` prefix when present. The bare
/// prefix maps to an empty base, which clears the description.
pub(crate) fn strip_incoming_prefix<'a>(from_account: &str, text: &'a str) -> &'a str {
    let text = text.trim();
    let Some(rest) = text
        .strip_prefix("Transfer from ")
        .and_then(|rest| rest.strip_prefix(from_account))
    else {
        return text;
    };
    if rest.is_empty() {
        return "";
    }
    rest.strip_prefix(':').map_or(text, str::trim_start)
}

fn corrupted(transfer_id: Uuid, reason: &str) -> EngineError {
    EngineError::CorruptedTransferState(format!("transfer {transfer_id}: {reason}"))
}

impl TransferPair {
    /// Verifies the rows loaded for `transfer_id` form a valid pair.
    pub(crate) fn resolve(transfer_id: Uuid, rows: Vec<LegRow>) -> ResultEngine<Self> {
        if rows.len() != 2 {
            return Err(corrupted(
                transfer_id,
                &format!("expected 2 legs, found {}", rows.len()),
            ));
        }

        let mut outgoing = None;
        let mut incoming = None;
        for row in rows {
            let link = row
                .model
                .transfer_link()?
                .filter(|link| link.transfer_id == transfer_id)
                .ok_or_else(|| corrupted(transfer_id, "leg is not linked to the transfer"))?;
            if row.direction != required_direction(link.role) {
                return Err(corrupted(
                    transfer_id,
                    &format!("{} leg has a mismatched category", link.role.as_str()),
                ));
            }
            let slot = match link.role {
                TransferRole::Outgoing => &mut outgoing,
                TransferRole::Incoming => &mut incoming,
            };
            if slot.replace(row).is_some() {
                return Err(corrupted(
                    transfer_id,
                    &format!("duplicated {} leg", link.role.as_str()),
                ));
            }
        }

        let (Some(outgoing), Some(incoming)) = (outgoing, incoming) else {
            return Err(corrupted(transfer_id, "missing leg"));
        };
        if outgoing.model.amount != incoming.model.amount {
            return Err(corrupted(transfer_id, "legs have different amounts"));
        }
        if outgoing.model.owner != incoming.model.owner {
            return Err(corrupted(transfer_id, "legs have different owners"));
        }

        Ok(Self {
            transfer_id,
            outgoing,
            incoming,
        })
    }

    pub(crate) fn leg(&self, role: TransferRole) -> &LegRow {
        match role {
            TransferRole::Outgoing => &self.outgoing,
            TransferRole::Incoming => &self.incoming,
        }
    }

    /// Role of the leg with the given id, if it belongs to this pair.
    pub(crate) fn role_of(&self, transaction_id: Uuid) -> Option<TransferRole> {
        if self.outgoing.model.id == transaction_id {
            Some(TransferRole::Outgoing)
        } else if self.incoming.model.id == transaction_id {
            Some(TransferRole::Incoming)
        } else {
            None
        }
    }
}
