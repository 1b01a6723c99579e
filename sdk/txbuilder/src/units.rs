use std::fmt;

use primitive_types::U256;

const WEI_DECIMALS: usize = 18;

/// Render a wei amount as decimal ether, without trailing zeros
pub fn format_ether(wei: U256) -> String {
    let unit = U256::exp10(WEI_DECIMALS);
    let whole = wei / unit;
    let frac = wei % unit;
    if frac.is_zero() {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", frac.to_string(), width = WEI_DECIMALS);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Wei amount that displays in ether
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Ether(pub U256);

impl fmt::Display for Ether {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", format_ether(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(tenths: u64) -> U256 {
        U256::from(tenths) * U256::exp10(17)
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(U256::zero()), "0");
        assert_eq!(format_ether(ether(10)), "1");
        assert_eq!(format_ether(ether(19)), "1.9");
        assert_eq!(format_ether(U256::one()), "0.000000000000000001");
        assert_eq!(format_ether(ether(61)), "6.1");
    }

    #[test]
    fn test_display() {
        assert_eq!(Ether(ether(1)).to_string(), "0.1 ETH");
    }
}
