/// Byte size of a transaction shape, used to price the fee
pub trait SizeEstimator {
    fn estimate(
        &self,
        n_inputs: usize,
        n_outputs: usize,
        n_public_outflows: usize,
        has_swap: bool,
        has_memo: bool,
    ) -> usize;
}

/// Exact encoded length of the proved transaction
#[derive(Debug, Clone, Copy, Default)]
pub struct WireSize;

impl SizeEstimator for WireSize {
    fn estimate(
        &self,
        n_inputs: usize,
        n_outputs: usize,
        n_public_outflows: usize,
        has_swap: bool,
        has_memo: bool,
    ) -> usize {
        veil_zktx::estimate_size(n_inputs, n_outputs, n_public_outflows, has_swap, has_memo)
    }
}

/// Constant size regardless of shape
#[derive(Debug, Clone, Copy)]
pub struct FixedSize(pub usize);

impl SizeEstimator for FixedSize {
    fn estimate(&self, _: usize, _: usize, _: usize, _: bool, _: bool) -> usize {
        self.0
    }
}
