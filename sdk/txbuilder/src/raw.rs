use ark_bn254::Fr;
use primitive_types::U256;
use veil_note::{Outflow, OutflowType, Sum, Utxo};

use crate::error::BalanceError;
use crate::units::Ether;

/// A balanced, unproved transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTx {
    pub inflow: Vec<Utxo>,
    pub outflow: Vec<Outflow>,
    pub swap: Option<Fr>,
    pub fee: U256,
}

impl RawTx {
    /// Fees paid on L1 by withdrawals and migrations, saturating at `U256::MAX`
    pub fn l1_fee(&self) -> U256 {
        checked_l1_fee(&self.outflow).unwrap_or(U256::MAX)
    }

    pub fn n_public_outflows(&self) -> usize {
        self.outflow
            .iter()
            .filter(|o| o.outflow_type() != OutflowType::Utxo)
            .count()
    }

    /// `inflow == outflow + fee + l1_fee` for ether, exact per-token equality for ERC20,
    /// equal id sets for ERC721. The swap commitment does not take part.
    pub fn verify_balance(&self) -> Result<(), BalanceError> {
        let inflow = Sum::from_notes(self.inflow.iter().map(Utxo::note))?;
        let outflow = Sum::from_notes(self.outflow.iter().map(Outflow::note))?;
        let l1_fee = checked_l1_fee(&self.outflow).ok_or(BalanceError::Overflow)?;

        let spent = outflow
            .eth
            .checked_add(self.fee)
            .and_then(|v| v.checked_add(l1_fee))
            .ok_or(BalanceError::Overflow)?;
        if spent != inflow.eth {
            return Err(BalanceError::Ether {
                inflow: Ether(inflow.eth),
                outflow: Ether(outflow.eth),
                fee: Ether(self.fee),
                l1_fee: Ether(l1_fee),
            });
        }

        for token in inflow.tokens().union(&outflow.tokens()) {
            let (a, b) = (inflow.erc20_amount(token), outflow.erc20_amount(token));
            if a != b {
                return Err(BalanceError::Erc20 {
                    token: *token,
                    inflow: a,
                    outflow: b,
                });
            }
            let mut a = inflow.erc721.get(token).cloned().unwrap_or_default();
            let mut b = outflow.erc721.get(token).cloned().unwrap_or_default();
            a.sort();
            b.sort();
            if a != b {
                return Err(BalanceError::Erc721 { token: *token });
            }
        }
        Ok(())
    }
}

pub(crate) fn checked_l1_fee(outflow: &[Outflow]) -> Option<U256> {
    outflow
        .iter()
        .try_fold(U256::zero(), |acc, o| acc.checked_add(o.external_fee()))
}
