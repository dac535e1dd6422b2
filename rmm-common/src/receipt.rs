//! Classified outcomes of broadcast transactions.
//!
//! A receipt starts as [`Receipt::Pending`] and moves exactly once to either
//! [`Receipt::Failed`] or [`Receipt::Succeeded`]. Reverts are ordinary values here and
//! never surface as errors.

use strum_macros::Display;

use crate::models::blockchain::RawReceipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ReceiptStatus {
    Pending,
    Failed,
    Succeeded,
}

/// Outcome of a single check on a sent transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt<T> {
    Pending,
    Failed { raw_receipt: RawReceipt },
    Succeeded { raw_receipt: RawReceipt, details: T },
}

/// Outcome of a transaction known to be mined.
#[derive(Debug, Clone, PartialEq)]
pub enum MinedReceipt<T> {
    Failed { raw_receipt: RawReceipt },
    Succeeded { raw_receipt: RawReceipt, details: T },
}

impl<T> Receipt<T> {
    pub fn status(&self) -> ReceiptStatus {
        match self {
            Receipt::Pending => ReceiptStatus::Pending,
            Receipt::Failed { .. } => ReceiptStatus::Failed,
            Receipt::Succeeded { .. } => ReceiptStatus::Succeeded,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Receipt::Pending)
    }

    pub fn raw_receipt(&self) -> Option<&RawReceipt> {
        match self {
            Receipt::Pending => None,
            Receipt::Failed { raw_receipt } | Receipt::Succeeded { raw_receipt, .. } => {
                Some(raw_receipt)
            }
        }
    }

    /// Converts into a [`MinedReceipt`], giving the receipt back if it is still pending.
    pub fn into_mined(self) -> Result<MinedReceipt<T>, Receipt<T>> {
        match self {
            Receipt::Pending => Err(Receipt::Pending),
            Receipt::Failed { raw_receipt } => Ok(MinedReceipt::Failed { raw_receipt }),
            Receipt::Succeeded { raw_receipt, details } => {
                Ok(MinedReceipt::Succeeded { raw_receipt, details })
            }
        }
    }
}

impl<T> MinedReceipt<T> {
    pub fn status(&self) -> ReceiptStatus {
        match self {
            MinedReceipt::Failed { .. } => ReceiptStatus::Failed,
            MinedReceipt::Succeeded { .. } => ReceiptStatus::Succeeded,
        }
    }

    pub fn raw_receipt(&self) -> &RawReceipt {
        match self {
            MinedReceipt::Failed { raw_receipt } | MinedReceipt::Succeeded { raw_receipt, .. } => {
                raw_receipt
            }
        }
    }

    pub fn details(&self) -> Option<&T> {
        match self {
            MinedReceipt::Failed { .. } => None,
            MinedReceipt::Succeeded { details, .. } => Some(details),
        }
    }
}

impl<T> From<MinedReceipt<T>> for Receipt<T> {
    fn from(value: MinedReceipt<T>) -> Self {
        match value {
            MinedReceipt::Failed { raw_receipt } => Receipt::Failed { raw_receipt },
            MinedReceipt::Succeeded { raw_receipt, details } => {
                Receipt::Succeeded { raw_receipt, details }
            }
        }
    }
}
