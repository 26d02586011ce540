//! The event reconciler — replays one block window of events against the
//! board state and publishes every square whose visible state changed.
//!
//! # Processing order
//!
//! Events are applied as a sequential merge-by-category, not a global
//! chronological merge: all Sold first, then all underlay
//! personalizations, then all primary personalizations. This is a
//! deliberate precedence order. It is safe because underlay events apply
//! their visual effect conditionally on the *current*
//! `is_main_personalized` flag, and primary events recompute truth from
//! the authoritative `suSquares` view call rather than from the event
//! payload. The resulting three-tier precedence (primary > underlay >
//! blank) holds for every physical arrival order within a run.

use async_trait::async_trait;

use crate::error::IndexError;
use crate::events::{PrimaryEvent, SoldEvent, SquareRecord, UnderlayEvent};
use crate::state::{
    neutral_pixels, IndexerState, Personalization, SquareExtra, UnderlayPersonalization,
    MAX_PRIMARY_EVENTS_PER_RUN,
};

/// Authoritative read of one square's current on-chain struct.
///
/// Implemented over `eth_call` in pixelgrid-evm; tests script it.
#[async_trait]
pub trait SquareReader: Send + Sync {
    async fn read_square(&self, square: u64) -> Result<SquareRecord, IndexError>;
}

/// Sink for a square's resolved visible state.
///
/// Implemented by the artifact publisher (raster tile + SVG + metadata);
/// tests record the calls.
pub trait SquarePublisher {
    fn publish(&mut self, square: u64, title: &str, href: &str, rgb: &[u8])
        -> Result<(), IndexError>;
}

/// Counts of what one reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub sold: usize,
    pub underlays: usize,
    pub primaries: usize,
    pub published: usize,
}

/// Apply one window of events to `state`, publishing every square whose
/// visible state changes.
///
/// Fails before any struct read if the primary event count exceeds
/// [`MAX_PRIMARY_EVENTS_PER_RUN`] — each read is an extra RPC round trip,
/// and a burst that size means the window should be split.
pub async fn reconcile<R, P>(
    state: &mut IndexerState,
    sold: &[SoldEvent],
    underlays: &[UnderlayEvent],
    primaries: &[PrimaryEvent],
    reader: &R,
    publisher: &mut P,
) -> Result<ReconcileSummary, IndexError>
where
    R: SquareReader,
    P: SquarePublisher,
{
    if primaries.len() > MAX_PRIMARY_EVENTS_PER_RUN {
        return Err(IndexError::TooManyPrimaryEvents {
            count: primaries.len(),
            limit: MAX_PRIMARY_EVENTS_PER_RUN,
        });
    }

    let mut summary = ReconcileSummary {
        sold: sold.len(),
        underlays: underlays.len(),
        primaries: primaries.len(),
        published: 0,
    };

    // 1. Sales reset squares to the minted-but-blank baseline.
    for ev in sold {
        let i = IndexerState::index(ev.square);
        state.extra[i] = Some(SquareExtra(ev.block, ev.block, false, 0));
        state.personalizations[i] = Some(Personalization::empty());
        publisher.publish(ev.square, "", "", &neutral_pixels())?;
        summary.published += 1;
        tracing::debug!(square = ev.square, block = ev.block, "square sold");
    }

    // 2. Underlay records update unconditionally; the visual effect only
    //    lands if the square exists and the primary is not covering it.
    for ev in underlays {
        let i = IndexerState::index(ev.square);
        state.underlays[i] = Some(UnderlayPersonalization(
            ev.title.clone(),
            ev.href.clone(),
            hex::encode(&ev.rgb),
        ));

        let visible = matches!(state.extra[i].as_ref(), Some(e) if !e.is_main_personalized());
        if visible {
            if let Some(extra) = state.extra[i].as_mut() {
                extra.1 = ev.block;
            }
            state.personalizations[i] =
                Some(Personalization::new(ev.title.clone(), ev.href.clone()));
            publisher.publish(ev.square, &ev.title, &ev.href, &ev.rgb)?;
            summary.published += 1;
        }
        tracing::debug!(square = ev.square, block = ev.block, visible, "underlay personalized");
    }

    // 3. Primary events: recompute truth from the authoritative view call.
    //    The event payload says nothing about whether the square is
    //    *actually* personalized now.
    for ev in primaries {
        let record = reader.read_square(ev.square).await?;
        let main_is_personalized = record.is_personalized();

        let i = IndexerState::index(ev.square);
        let minted = state.extra[i]
            .as_ref()
            .map(SquareExtra::minted_block)
            .unwrap_or(ev.block);
        state.extra[i] = Some(SquareExtra(minted, ev.block, main_is_personalized, record.version));

        if main_is_personalized {
            state.personalizations[i] =
                Some(Personalization::new(record.title.clone(), record.href.clone()));
            publisher.publish(ev.square, &record.title, &record.href, &record.rgb)?;
        } else if let Some(underlay) = state.underlays[i].clone() {
            let rgb = hex::decode(underlay.rgb_hex()).map_err(|e| {
                IndexError::Decode(format!("underlay rgb for square {}: {e}", ev.square))
            })?;
            state.personalizations[i] =
                Some(Personalization::new(underlay.title(), underlay.href()));
            publisher.publish(ev.square, underlay.title(), underlay.href(), &rgb)?;
        } else {
            state.personalizations[i] = Some(Personalization::empty());
            publisher.publish(ev.square, "", "", &neutral_pixels())?;
        }
        summary.published += 1;
        tracing::debug!(
            square = ev.square,
            block = ev.block,
            main_is_personalized,
            "primary personalized"
        );
    }

    tracing::info!(
        sold = summary.sold,
        underlays = summary.underlays,
        primaries = summary.primaries,
        published = summary.published,
        "window reconciled"
    );
    Ok(summary)
}
