//! Running balances over ordered buckets.

use serde::Serialize;

use crate::{Error, analytics::period::Bucket};

/// A bucket with the running balance carried into and out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancedBucket {
    #[serde(flatten)]
    pub bucket: Bucket,
    pub net: f64,
    pub opening_balance: f64,
    pub closing_balance: f64,
}

impl BalancedBucket {
    /// A bucket with no activity and a zero balance.
    pub fn zeroed(bucket: Bucket) -> Self {
        Self {
            bucket,
            net: 0.0,
            opening_balance: 0.0,
            closing_balance: 0.0,
        }
    }
}

/// Calculates opening and closing balances as a left fold over `buckets`.
///
/// The first bucket opens at zero, nothing before the supplied window is
/// known. Each bucket closes at its opening balance plus its net and the next
/// bucket opens where the previous one closed.
///
/// # Errors
///
/// Returns [Error::Computation] if the buckets are not strictly ascending in
/// time or mix granularities. Buckets produced by
/// [bucket](crate::analytics::bucket) always satisfy this.
pub fn accumulate(buckets: Vec<Bucket>) -> Result<Vec<BalancedBucket>, Error> {
    if let Some(pair) = buckets.windows(2).find(|pair| {
        pair[0].period.granularity() != pair[1].period.granularity()
            || pair[0].period >= pair[1].period
    }) {
        tracing::error!(
            "buckets out of order: {} followed by {}",
            pair[0].period,
            pair[1].period
        );
        return Err(Error::Computation(format!(
            "bucket {} is not strictly before bucket {}",
            pair[0].period, pair[1].period
        )));
    }

    let mut running_balance = 0.0;

    Ok(buckets
        .into_iter()
        .map(|bucket| {
            let net = bucket.net();
            let opening_balance = running_balance;
            let closing_balance = opening_balance + net;
            running_balance = closing_balance;

            BalancedBucket {
                bucket,
                net,
                opening_balance,
                closing_balance,
            }
        })
        .collect())
}
