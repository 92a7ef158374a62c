//! Transaction validation for the ballot program

use agora_core::{
    AgoraError, AgoraResult, BallotConfig, StateProvider, Timestamp, TransactionValidator,
};
use agora_state::{account_key, AccountState};
use async_trait::async_trait;

use crate::instruction::BallotInstruction;
use crate::transaction::BallotTransaction;

/// Ballot transaction validator
pub struct BallotTransactionValidator {
    config: BallotConfig,
}

impl BallotTransactionValidator {
    pub fn new(config: BallotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BallotConfig {
        &self.config
    }

    /// Validate transaction structure at ledger time `now`
    pub fn validate_structure(&self, tx: &BallotTransaction, now: Timestamp) -> AgoraResult<()> {
        if tx.is_expired(self.config.tx_expiry_seconds, now) {
            return Err(AgoraError::TransactionExpired);
        }

        match &tx.instruction {
            BallotInstruction::InitialiseVoting { seed, .. } => {
                if seed.is_empty() {
                    return Err(AgoraError::InvalidTransaction("Empty session seed".into()));
                }
                if seed.len() > self.config.max_seed_len {
                    return Err(AgoraError::InvalidTransaction(format!(
                        "Seed of {} bytes exceeds maximum {}",
                        seed.len(),
                        self.config.max_seed_len
                    )));
                }
            }
            BallotInstruction::AddProposal { text, .. } => {
                if text.len() > self.config.max_proposal_text_len {
                    return Err(AgoraError::InvalidTransaction(format!(
                        "Proposal text of {} bytes exceeds maximum {}",
                        text.len(),
                        self.config.max_proposal_text_len
                    )));
                }
            }
            BallotInstruction::Vote { .. } | BallotInstruction::Tally { .. } => {}
        }

        Ok(())
    }

    /// Validate the replay nonce against state
    pub async fn validate_against_state(
        &self,
        tx: &BallotTransaction,
        state: &dyn StateProvider,
    ) -> AgoraResult<()> {
        let account = match state.get(&account_key(&tx.signer)).await? {
            Some(bytes) => AccountState::from_bytes(&bytes)?,
            None => AccountState::default(),
        };

        if tx.nonce.0 != account.nonce {
            return Err(AgoraError::InvalidNonce {
                expected: account.nonce,
                got: tx.nonce.0,
            });
        }

        Ok(())
    }
}

/// Structure and nonce checks; the signature is checked when the ledger
/// builds its [`VerifiedTransaction`](crate::transaction::VerifiedTransaction)
#[async_trait]
impl TransactionValidator<BallotTransaction> for BallotTransactionValidator {
    async fn validate(
        &self,
        tx: &BallotTransaction,
        state: &dyn StateProvider,
        now: Timestamp,
    ) -> AgoraResult<()> {
        self.validate_structure(tx, now)?;
        self.validate_against_state(tx, state).await
    }
}
