// =============================================================================
// merge.rs — MANY PARTIAL TRUTHS, ONE PARCEL
// =============================================================================
//
// Every provider that answered hands in a partial ParcelInfo. This module
// folds them into one, left to right:
//
// - text fields and numbers: the first non-empty / non-zero value wins
// - tracking numbers:        everything, concatenated, duplicates and all
// - events:                  everything, concatenated, then newest first
//
// Input order is the tie-break. The dispatcher passes records in
// registration order, so an earlier registered courier gets the final say on
// destination, origin and friends.
// =============================================================================

use crate::models::ParcelInfo;

/// Merge partial records into one canonical record.
///
/// Pure and infallible. An empty slice yields `ParcelInfo::default()` and a
/// single record yields an equal copy. The inputs are only borrowed.
pub fn merge_parcels(parcels: &[ParcelInfo]) -> ParcelInfo {
    let mut merged = ParcelInfo::default();
    let mut events = Vec::with_capacity(parcels.iter().map(|p| p.events().len()).sum());

    for parcel in parcels {
        merged
            .tracking_numbers
            .extend(parcel.tracking_numbers.iter().cloned());

        fill_text(&mut merged.destination, &parcel.destination);
        fill_text(&mut merged.origin, &parcel.origin);
        fill_text(&mut merged.channel, &parcel.channel);
        fill_text(&mut merged.provider_label, &parcel.provider_label);

        if merged.weight_kg == 0.0 {
            merged.weight_kg = parcel.weight_kg;
        }
        if merged.days_in_transit == 0 {
            merged.days_in_transit = parcel.days_in_transit;
        }

        events.extend(parcel.events().iter().cloned());
    }

    merged.extend_events(events);
    merged
}

fn fill_text(slot: &mut String, candidate: &str) {
    if slot.is_empty() && !candidate.is_empty() {
        *slot = candidate.to_string();
    }
}
