//! Hedge error types and their contract revert encoding.

use alloy::sol_types::{Revert, SolError};
use strands_venue::VenueError;
use thiserror::Error;

mod abi {
    use alloy::sol;

    // Custom errors as declared by the strategy contract.
    sol! {
        error InvalidStrikeId();
        error InvalidAmount();
        error NoApprovedLiquidity();
        error InvalidPosition();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HedgeError {
    /// Strike id is zero, unknown, or its board is frozen or expired.
    #[error("InvalidStrikeId")]
    InvalidStrikeId,

    #[error("InvalidAmount")]
    InvalidAmount,

    /// Premium allowance granted to the strategy does not cover the quote.
    #[error("NoApprovedLiquidity")]
    NoApprovedLiquidity,

    #[error("InvalidPosition")]
    InvalidPosition,

    #[error(transparent)]
    Venue(#[from] VenueError),

    /// The strategy actor has stopped.
    #[error("Strategy service unavailable")]
    ServiceUnavailable,
}

impl HedgeError {
    /// Short name used as the revert reason and metrics label.
    pub fn revert_reason(&self) -> String {
        match self {
            Self::InvalidStrikeId => "InvalidStrikeId".to_string(),
            Self::InvalidAmount => "InvalidAmount".to_string(),
            Self::NoApprovedLiquidity => "NoApprovedLiquidity".to_string(),
            Self::InvalidPosition => "InvalidPosition".to_string(),
            Self::Venue(err) => err
                .revert_reason()
                .map_or_else(|| err.to_string(), str::to_string),
            Self::ServiceUnavailable => "ServiceUnavailable".to_string(),
        }
    }

    /// Metrics label: the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidStrikeId => "InvalidStrikeId",
            Self::InvalidAmount => "InvalidAmount",
            Self::NoApprovedLiquidity => "NoApprovedLiquidity",
            Self::InvalidPosition => "InvalidPosition",
            Self::Venue(_) => "Venue",
            Self::ServiceUnavailable => "ServiceUnavailable",
        }
    }

    /// ABI-encoded revert data: a custom error for validation failures,
    /// `Error(string)` for everything else.
    pub fn revert_data(&self) -> Vec<u8> {
        match self {
            Self::InvalidStrikeId => abi::InvalidStrikeId {}.abi_encode(),
            Self::InvalidAmount => abi::InvalidAmount {}.abi_encode(),
            Self::NoApprovedLiquidity => abi::NoApprovedLiquidity {}.abi_encode(),
            Self::InvalidPosition => abi::InvalidPosition {}.abi_encode(),
            Self::Venue(_) | Self::ServiceUnavailable => Revert {
                reason: self.revert_reason(),
            }
            .abi_encode(),
        }
    }

    /// `revert_data` as 0x-prefixed hex.
    pub fn revert_data_hex(&self) -> String {
        format!("0x{}", hex::encode(self.revert_data()))
    }

    /// Whether the call was rejected before touching any collaborator state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidStrikeId
                | Self::InvalidAmount
                | Self::NoApprovedLiquidity
                | Self::InvalidPosition
        )
    }
}

pub type HedgeResult<T> = Result<T, HedgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_reason_matches_custom_error_name() {
        assert_eq!(HedgeError::InvalidStrikeId.revert_reason(), "InvalidStrikeId");
        assert_eq!(HedgeError::InvalidAmount.to_string(), "InvalidAmount");
        assert_eq!(HedgeError::InvalidPosition.revert_reason(), "InvalidPosition");
    }

    #[test]
    fn test_revert_data_is_four_byte_selector() {
        let data = HedgeError::InvalidPosition.revert_data();
        assert_eq!(data.len(), 4);
        assert_eq!(data, abi::InvalidPosition::SELECTOR.to_vec());
        assert_ne!(
            HedgeError::InvalidAmount.revert_data(),
            HedgeError::InvalidStrikeId.revert_data()
        );
    }

    #[test]
    fn test_venue_revert_encodes_error_string() {
        let err = HedgeError::from(VenueError::reverted("PerpsV2Market", "previous order exists"));
        assert_eq!(err.revert_reason(), "previous order exists");
        let data = err.revert_data();
        // Error(string) selector
        assert_eq!(&data[..4], &[0x08, 0xc3, 0x79, 0xa0]);
        assert!(err.revert_data_hex().starts_with("0x08c379a0"));
        assert!(!err.is_validation());
    }
}
