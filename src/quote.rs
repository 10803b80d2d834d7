//! Input records supplied by the market-data collaborator.
//!
//! A run receives one [`MarketContext`] and a slice of [`OptionQuote`]s per
//! contract side. Both are read-only for the duration of the run.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::conventions;
use crate::error::IvSurfaceError;
use crate::types::OptionType;
use crate::validate::{validate_finite, validate_positive};

/// A single option-chain row.
///
/// Prices are optional because upstream chains routinely omit bid/ask for
/// illiquid strikes. Non-finite values are treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Strike price `K`.
    pub strike: f64,
    /// Best bid, if quoted.
    pub bid: Option<f64>,
    /// Best ask, if quoted.
    pub ask: Option<f64>,
    /// Last traded price, if any.
    pub last_price: Option<f64>,
    /// Expiration date of the contract.
    pub expiration: NaiveDate,
    /// Call or put.
    pub side: OptionType,
}

impl OptionQuote {
    /// Observed market price of the contract.
    ///
    /// Mid of bid and ask when both are present and finite, otherwise the
    /// last traded price, otherwise `None`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use ivsurface::{OptionQuote, OptionType};
    ///
    /// let quote = OptionQuote {
    ///     strike: 100.0,
    ///     bid: Some(4.0),
    ///     ask: None,
    ///     last_price: Some(4.3),
    ///     expiration: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
    ///     side: OptionType::Call,
    /// };
    /// assert_eq!(quote.market_price(), Some(4.3));
    /// ```
    pub fn market_price(&self) -> Option<f64> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        match (finite(self.bid), finite(self.ask)) {
            (Some(bid), Some(ask)) => Some(0.5 * (bid + ask)),
            _ => finite(self.last_price),
        }
    }
}

/// Market state shared by every quote in a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Underlying spot price `S`.
    pub underlying_price: f64,
    /// Annualized continuously-compounded risk-free rate `r`.
    pub risk_free_rate: f64,
    /// Time at which the surface is evaluated.
    pub evaluation_time: NaiveDateTime,
}

impl MarketContext {
    /// Create a validated market context.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] if the spot is not positive
    /// and finite, or the rate is not finite.
    pub fn new(
        underlying_price: f64,
        risk_free_rate: f64,
        evaluation_time: NaiveDateTime,
    ) -> crate::error::Result<Self> {
        let ctx = Self {
            underlying_price,
            risk_free_rate,
            evaluation_time,
        };
        ctx.validate()?;
        Ok(ctx)
    }

    /// Check the invariants of a context built field-by-field (e.g. deserialized).
    ///
    /// # Errors
    /// Same conditions as [`MarketContext::new`].
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_positive(self.underlying_price, "underlying price")?;
        validate_finite(self.risk_free_rate, "risk-free rate")?;
        Ok(())
    }

    /// Time to expiry in years for a contract expiring on `expiration`.
    pub fn time_to_expiry(&self, expiration: NaiveDate) -> f64 {
        conventions::year_fraction(self.evaluation_time.date(), expiration)
    }
}

/// Per-quote inputs to the pricer and solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInputs {
    /// Underlying spot `S`.
    pub spot: f64,
    /// Strike `K`.
    pub strike: f64,
    /// Time to expiry `T` in years.
    pub expiry: f64,
    /// Continuously compounded risk-free rate `r`.
    pub rate: f64,
    /// Call or put.
    pub side: OptionType,
}

impl PricingInputs {
    /// Derive pricing inputs for `quote` under `ctx`.
    ///
    /// The resulting `expiry` may be non-positive; callers drop such quotes
    /// before solving.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] for a non-positive or
    /// non-finite strike.
    pub fn from_quote(quote: &OptionQuote, ctx: &MarketContext) -> crate::error::Result<Self> {
        if !quote.strike.is_finite() || quote.strike <= 0.0 {
            return Err(IvSurfaceError::InvalidInput {
                message: format!(
                    "strike must be positive and finite, got {} (expiration {})",
                    quote.strike, quote.expiration
                ),
            });
        }
        Ok(Self {
            spot: ctx.underlying_price,
            strike: quote.strike,
            expiry: ctx.time_to_expiry(quote.expiration),
            rate: ctx.risk_free_rate,
            side: quote.side,
        })
    }

    /// Side-oriented moneyness of these inputs.
    pub fn moneyness(&self) -> f64 {
        conventions::moneyness(self.side, self.spot, self.strike)
    }
}

/// Inclusive expiration-date window. Unbounded ends accept everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryWindow {
    /// Earliest accepted expiration (inclusive).
    pub start: Option<NaiveDate>,
    /// Latest accepted expiration (inclusive).
    pub end: Option<NaiveDate>,
}

impl ExpiryWindow {
    /// A window accepting every expiration.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A window bounded on both ends.
    ///
    /// # Errors
    /// Returns [`IvSurfaceError::InvalidInput`] if `start` is after `end`.
    pub fn between(start: NaiveDate, end: NaiveDate) -> crate::error::Result<Self> {
        if start > end {
            return Err(IvSurfaceError::InvalidInput {
                message: format!("expiry window start {start} is after end {end}"),
            });
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Whether `expiration` falls inside the window.
    pub fn contains(&self, expiration: NaiveDate) -> bool {
        self.start.is_none_or(|s| expiration >= s) && self.end.is_none_or(|e| expiration <= e)
    }
}
