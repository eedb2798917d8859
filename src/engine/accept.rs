use std::collections::BTreeMap;

use crate::detect::result::Detection;
use crate::engine::geometry::CenterRegion;
use crate::ClassId;

/// The per-class winner for one frame and its center-containment verdict.
#[derive(Clone, Debug)]
pub struct Assessment {
    pub detection: Detection,
    pub in_center: bool,
}

/// Per-frame acceptance policy. Pure: no hidden state.
///
/// 1. Drop detections below the confidence threshold (equal survives).
/// 2. Per class, keep the single best detection: highest confidence, ties
///    broken by larger box area, then by smaller x.
/// 3. Evaluate center containment of each winner's centroid.
///
/// Classes with no surviving detection are absent from the output, which
/// distinguishes "nothing seen" from "seen but rejected".
pub fn assess_frame(
    detections: &[Detection],
    confidence_threshold: f32,
    region: &CenterRegion,
) -> BTreeMap<ClassId, Assessment> {
    let mut winners: BTreeMap<ClassId, &Detection> = BTreeMap::new();

    for detection in detections {
        if detection.confidence < confidence_threshold {
            continue;
        }
        match winners.get(&detection.class) {
            Some(current) if !beats(detection, current) => {}
            _ => {
                winners.insert(detection.class, detection);
            }
        }
    }

    winners
        .into_iter()
        .map(|(class, detection)| {
            let (cx, cy) = detection.bbox.center();
            (
                class,
                Assessment {
                    detection: detection.clone(),
                    in_center: region.contains(cx, cy),
                },
            )
        })
        .collect()
}

/// Deterministic winner ordering: confidence, then area, then leftmost x.
fn beats(challenger: &Detection, incumbent: &Detection) -> bool {
    if challenger.confidence != incumbent.confidence {
        return challenger.confidence > incumbent.confidence;
    }
    let (ca, ia) = (challenger.bbox.area(), incumbent.bbox.area());
    if ca != ia {
        return ca > ia;
    }
    challenger.bbox.x < incumbent.bbox.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    fn det(class: ClassId, confidence: f32, x: u32, w: u32, h: u32) -> Detection {
        Detection {
            class,
            confidence,
            bbox: BoundingBox::new(x, 200, w, h),
        }
    }

    fn region() -> CenterRegion {
        CenterRegion::new(640, 480, 0.3).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(assess_frame(&[], 0.5, &region()).is_empty());
    }

    #[test]
    fn below_threshold_detections_never_appear() {
        let detections = vec![
            det(ClassId::Squirrel, 0.9, 300, 40, 40),
            det(ClassId::Squirrel, 0.4, 310, 40, 40),
        ];
        let out = assess_frame(&detections, 0.5, &region());
        assert_eq!(out.len(), 1);
        assert_eq!(out[&ClassId::Squirrel].detection.confidence, 0.9);
    }

    #[test]
    fn confidence_equal_to_threshold_is_accepted() {
        let detections = vec![det(ClassId::Skunk, 0.5, 300, 40, 40)];
        let out = assess_frame(&detections, 0.5, &region());
        assert!(out.contains_key(&ClassId::Skunk));
    }

    #[test]
    fn ties_break_by_area_then_leftmost_x() {
        // Same confidence, larger box wins.
        let detections = vec![
            det(ClassId::Raccoon, 0.7, 100, 20, 20),
            det(ClassId::Raccoon, 0.7, 400, 30, 30),
        ];
        let out = assess_frame(&detections, 0.5, &region());
        assert_eq!(out[&ClassId::Raccoon].detection.bbox.x, 400);

        // Same confidence and area, leftmost wins.
        let detections = vec![
            det(ClassId::Raccoon, 0.7, 400, 20, 20),
            det(ClassId::Raccoon, 0.7, 100, 20, 20),
        ];
        let out = assess_frame(&detections, 0.5, &region());
        assert_eq!(out[&ClassId::Raccoon].detection.bbox.x, 100);
    }

    #[test]
    fn winners_are_selected_independently_per_class() {
        let detections = vec![
            det(ClassId::Squirrel, 0.6, 300, 40, 40),
            det(ClassId::Skunk, 0.8, 10, 40, 40),
        ];
        let out = assess_frame(&detections, 0.5, &region());
        assert_eq!(out.len(), 2);
        // Squirrel centroid (320, 220) inside; skunk centroid (30, 220) outside.
        assert!(out[&ClassId::Squirrel].in_center);
        assert!(!out[&ClassId::Skunk].in_center);
    }
}
