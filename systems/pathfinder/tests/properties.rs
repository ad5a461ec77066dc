use std::collections::BTreeSet;

use grid_tactics_core::{Grid, Point, Tile};
use grid_tactics_system_pathfinder::PathFinder;
use proptest::prelude::*;

fn finder_for(width: u32, height: u32, blocked: &[bool]) -> PathFinder {
    let rows = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    let index = (y * width + x) as usize;
                    u32::from(blocked.get(index).copied().unwrap_or(false))
                })
                .collect()
        })
        .collect();
    let mut finder = PathFinder::new();
    finder.set_acceptable_tiles([Tile::WALKABLE]);
    finder.set_grid(Grid::from_rows(rows).expect("valid grid"));
    finder
}

fn scenario() -> impl Strategy<Value = (u32, u32, Vec<bool>, Point)> {
    (1_u32..9, 1_u32..9).prop_flat_map(|(width, height)| {
        (
            Just(width),
            Just(height),
            prop::collection::vec(prop::bool::weighted(0.25), (width * height) as usize),
            (0..width as i32, 0..height as i32).prop_map(|(x, y)| Point::new(x, y)),
        )
    })
}

proptest! {
    #[test]
    fn open_grid_paths_are_manhattan_optimal(
        (width, height, start, end) in (1_u32..10, 1_u32..10).prop_flat_map(|(w, h)| (
            Just(w),
            Just(h),
            (0..w as i32, 0..h as i32),
            (0..w as i32, 0..h as i32),
        ))
    ) {
        let finder = finder_for(width, height, &[]);
        let start = Point::new(start.0, start.1);
        let end = Point::new(end.0, end.1);
        let path = finder.find_path(start, end).expect("configured").path.expect("open grid");
        let moves = path.len().saturating_sub(1) as u32;
        prop_assert_eq!(moves, start.manhattan_distance(end));
    }

    #[test]
    fn zones_grow_with_budget(
        (width, height, blocked, start) in scenario(),
        small in 0_u32..6,
        extra in 1_u32..6,
    ) {
        let finder = finder_for(width, height, &blocked);
        let near: BTreeSet<_> = finder
            .find_zone(start, small, 0)
            .expect("configured")
            .zone
            .points()
            .collect();
        let far: BTreeSet<_> = finder
            .find_zone(start, small + extra, 0)
            .expect("configured")
            .zone
            .points()
            .collect();
        prop_assert!(near.is_subset(&far));
    }

    #[test]
    fn extension_only_adds_points(
        (width, height, blocked, start) in scenario(),
        budget in 0_u32..5,
        rings in 0_u32..4,
    ) {
        let finder = finder_for(width, height, &blocked);
        let result = finder.find_zone(start, budget, rings).expect("configured");
        match result.extended_zone {
            None => prop_assert_eq!(rings, 0),
            Some(extended) => {
                for point in result.zone.points() {
                    let entry = extended.get(point);
                    prop_assert!(entry.is_some_and(|entry| entry.distance == 0));
                }
                for entry in extended.iter() {
                    prop_assert!(entry.distance <= rings);
                    prop_assert!(!finder.point_is_out_of_grid(entry.point));
                }
            }
        }
    }

    #[test]
    fn cover_zone_matches_manhattan_ball(
        (width, height, blocked, center) in scenario(),
        radius in 0_u32..6,
    ) {
        let finder = finder_for(width, height, &blocked);
        let covered: BTreeSet<_> = finder
            .cover_zone(center, radius)
            .expect("center in grid")
            .points()
            .collect();
        let expected: BTreeSet<_> = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| Point::new(x, y)))
            .filter(|point| point.manhattan_distance(center) <= radius)
            .collect();
        prop_assert_eq!(covered, expected);
    }

    #[test]
    fn searches_repeat_identically(
        (width, height, blocked, start) in scenario(),
        budget in 0_u32..8,
    ) {
        let finder = finder_for(width, height, &blocked);
        let first = finder.find_zone(start, budget, 1).expect("configured");
        let second = finder.find_zone(start, budget, 1).expect("configured");
        prop_assert_eq!(first.zone, second.zone);
        prop_assert_eq!(first.extended_zone, second.extended_zone);
    }
}
