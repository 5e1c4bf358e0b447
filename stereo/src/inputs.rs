//! Validated aggregation inputs
//!
//! Every shape and configuration check happens here, before any sweep
//! starts. Once a [`SweepInputs`] exists the sweeps themselves cannot fail.

use sgm_core::{CostVolume, PenaltyField, SegmentationMap, VolumeShape};

use crate::{Direction, Error, Result};

/// Borrowed, consistency-checked inputs of one aggregation run.
#[derive(Debug, Clone, Copy)]
pub struct SweepInputs<'a> {
    pub cost: &'a CostVolume,
    pub p1: &'a PenaltyField,
    pub p2: &'a PenaltyField,
    pub directions: &'a [Direction],
    pub segmentation: Option<&'a SegmentationMap>,
}

impl<'a> SweepInputs<'a> {
    pub fn new(
        cost: &'a CostVolume,
        p1: &'a PenaltyField,
        p2: &'a PenaltyField,
        directions: &'a [Direction],
        segmentation: Option<&'a SegmentationMap>,
    ) -> Result<Self> {
        if directions.is_empty() {
            return Err(Error::invalid_parameters(
                "At least one aggregation direction is required",
            ));
        }

        let shape = cost.shape;
        if shape.is_empty() {
            return Err(Error::DimensionMismatch(format!(
                "Cost volume dimensions must be non-zero, got {shape}"
            )));
        }
        check_buffer("cost", cost.data.len(), shape)?;

        let penalty_shape = VolumeShape::new(shape.rows, shape.cols, directions.len());
        for (name, field) in [("p1", p1), ("p2", p2)] {
            if field.shape != penalty_shape {
                return Err(Error::DimensionMismatch(format!(
                    "{name} has shape {}, expected {penalty_shape} ({} directions)",
                    field.shape,
                    directions.len()
                )));
            }
            check_buffer(name, field.data.len(), field.shape)?;
        }

        if let Some(seg) = segmentation {
            if seg.hw() != shape.hw() {
                return Err(Error::DimensionMismatch(format!(
                    "Segmentation is {}x{}, expected {}x{}",
                    seg.rows, seg.cols, shape.rows, shape.cols
                )));
            }
            if seg.data.len() != seg.rows * seg.cols {
                return Err(Error::DimensionMismatch(format!(
                    "Segmentation holds {} labels, expected {}",
                    seg.data.len(),
                    seg.rows * seg.cols
                )));
            }
        }

        Ok(Self {
            cost,
            p1,
            p2,
            directions,
            segmentation,
        })
    }

    pub fn shape(&self) -> VolumeShape {
        self.cost.shape
    }

    pub fn num_directions(&self) -> usize {
        self.directions.len()
    }
}

/// Public fields allow a volume whose buffer disagrees with its shape.
fn check_buffer(name: &str, len: usize, shape: VolumeShape) -> Result<()> {
    if Some(len) != shape.checked_len() {
        return Err(Error::DimensionMismatch(format!(
            "{name} holds {len} values, expected {} for shape {shape}",
            shape.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volumes(
        rows: usize,
        cols: usize,
        disp: usize,
        dirs: usize,
    ) -> (CostVolume, PenaltyField, PenaltyField) {
        (
            CostVolume::zeros(rows, cols, disp),
            PenaltyField::uniform(rows, cols, dirs, 8.0),
            PenaltyField::uniform(rows, cols, dirs, 32.0),
        )
    }

    #[test]
    fn test_accepts_consistent_inputs() {
        let (cost, p1, p2) = volumes(3, 4, 5, 8);
        let seg = SegmentationMap::uniform(3, 4);
        let directions = Direction::EIGHT_CONNECTED;
        let inputs = SweepInputs::new(&cost, &p1, &p2, &directions, Some(&seg)).unwrap();
        assert_eq!(inputs.num_directions(), 8);
        assert_eq!(inputs.shape(), VolumeShape::new(3, 4, 5));
    }

    #[test]
    fn test_rejects_penalty_direction_mismatch() {
        let (cost, p1, p2) = volumes(3, 3, 3, 7);
        let directions = Direction::EIGHT_CONNECTED;
        let err = SweepInputs::new(&cost, &p1, &p2, &directions, None).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_rejects_mismatched_p2() {
        let (cost, p1, _) = volumes(3, 3, 3, 1);
        let p2 = PenaltyField::uniform(3, 2, 1, 32.0);
        let err = SweepInputs::new(&cost, &p1, &p2, &[Direction::RIGHT], None).unwrap_err();
        assert!(err.to_string().contains("p2"));
    }

    #[test]
    fn test_rejects_segmentation_mismatch() {
        let (cost, p1, p2) = volumes(3, 3, 3, 1);
        let seg = SegmentationMap::uniform(3, 4);
        let err = SweepInputs::new(&cost, &p1, &p2, &[Direction::DOWN], Some(&seg)).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_rejects_empty_inputs() {
        let (cost, p1, p2) = volumes(3, 3, 3, 1);
        let err = SweepInputs::new(&cost, &p1, &p2, &[], None).unwrap_err();
        assert!(err.is_configuration());

        let (cost, p1, p2) = volumes(3, 3, 0, 1);
        let err = SweepInputs::new(&cost, &p1, &p2, &[Direction::UP], None).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_rejects_corrupt_buffer() {
        let (mut cost, p1, p2) = volumes(2, 2, 2, 1);
        cost.data.pop();
        let res = SweepInputs::new(&cost, &p1, &p2, &[Direction::LEFT], None);
        assert!(res.is_err());
    }
}
