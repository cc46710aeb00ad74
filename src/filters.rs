//! Metadata filters — spec.md §4.3.
//!
//! Pure functions over a device's buffered frames. No allocation beyond
//! the output size, no I/O, total (never panics on well-formed input).

use crate::model::Frame;

/// Retain only fine-timestamped receptions in each frame, then drop any
/// frame whose surviving reception count falls below `min_per_frame`.
/// Order of surviving frames and receptions is preserved.
///
/// This is the TDOA eligibility filter (spec.md §4.5 strategy 3, §8
/// property 4): TDOA needs at least 3 fine-timestamped receptions per
/// frame to triangulate.
pub fn filter_on_fine_timestamp(buffer: &[Frame], min_per_frame: usize) -> Vec<Frame> {
    buffer
        .iter()
        .filter_map(|frame| {
            let retained: Frame = frame
                .iter()
                .filter(|rx| rx.fine_timestamp.is_some())
                .cloned()
                .collect();
            if retained.len() >= min_per_frame {
                Some(retained)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AntennaLocation, UplinkReception};

    fn rx(gateway: u8, fine_ts: Option<u64>) -> UplinkReception {
        UplinkReception {
            gateway_id: [gateway; 8],
            uplink_id: vec![gateway],
            rssi: -80,
            snr: 1.0,
            antenna_location: AntennaLocation {
                latitude: 1.0,
                longitude: 2.0,
                altitude: 3.0,
            },
            fine_timestamp: fine_ts,
        }
    }

    #[test]
    fn drops_frames_below_threshold() {
        let frame_ok: Frame = vec![
            rx(1, Some(111)),
            rx(2, Some(222)),
            rx(3, Some(333)),
        ];
        let frame_short: Frame = vec![rx(1, Some(111)), rx(2, None), rx(3, None)];
        let buffer = vec![frame_ok.clone(), frame_short];

        let filtered = filter_on_fine_timestamp(&buffer, 3);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].len(), 3);
        assert_eq!(filtered[0][0].gateway_id, frame_ok[0].gateway_id);
    }

    #[test]
    fn preserves_order_of_surviving_receptions() {
        let frame: Frame = vec![
            rx(1, Some(1)),
            rx(2, None),
            rx(3, Some(3)),
            rx(4, Some(4)),
        ];
        let filtered = filter_on_fine_timestamp(&[frame], 3);
        assert_eq!(filtered.len(), 1);
        let ids: Vec<u8> = filtered[0].iter().map(|r| r.gateway_id[0]).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn empty_buffer_yields_empty_result() {
        let filtered = filter_on_fine_timestamp(&[], 3);
        assert!(filtered.is_empty());
    }

    #[test]
    fn all_frames_dropped_when_none_qualify() {
        let frame: Frame = vec![rx(1, None), rx(2, None)];
        let filtered = filter_on_fine_timestamp(&[frame], 3);
        assert!(filtered.is_empty());
    }
}
