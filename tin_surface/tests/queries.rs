use std::sync::Arc;

use rayon::prelude::*;
use tin_surface::lidar::LidarPoint;
use tin_surface::TinSurface;

fn rolling_surface() -> TinSurface {
    let mut pts = Vec::new();
    for j in 0..40 {
        for i in 0..40 {
            // Small deterministic jitter avoids a perfectly regular lattice.
            let x = i as f64 * 2.5 + ((i * 7 + j * 3) % 5) as f64 * 0.1;
            let y = j as f64 * 2.5 + ((i * 3 + j * 11) % 7) as f64 * 0.1;
            let z = 50.0 + (x / 10.0).sin() * 4.0 + (y / 15.0).cos() * 3.0;
            pts.push(LidarPoint::new(x, y, z, 2));
        }
    }
    TinSurface::from_points(pts).unwrap()
}

fn positions(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            ((t * 0.618_033_988).fract() * 100.0, (t * 0.414_213_562).fract() * 100.0)
        })
        .collect()
}

#[test]
fn concurrent_queries_match_sequential() {
    let surface = Arc::new(rolling_surface());
    let pos = positions(10_000);
    let sequential: Vec<_> = pos.iter().map(|&(x, y)| surface.query(x, y)).collect();

    let parallel: Vec<_> = pos.par_iter().map(|&(x, y)| surface.query(x, y)).collect();
    assert_eq!(parallel, sequential);

    let chunks: Vec<Vec<(f64, f64)>> = pos.chunks(1_000).map(|c| c.to_vec()).collect();
    let threaded: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                let surface = Arc::clone(&surface);
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|&(x, y)| surface.elevation(x, y))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });
    let expected: Vec<_> = sequential.iter().map(|q| q.elevation).collect();
    assert_eq!(threaded, expected);
    assert_eq!(surface.sample_elevations(&pos), expected);
    assert!(expected.iter().filter(|z| z.is_some()).count() > 8_500);
}

#[test]
fn hand_computed_plane() {
    // z = 10 + 0.5x + 0.25y
    let pts = vec![
        LidarPoint::new(0.0, 0.0, 10.0, 2),
        LidarPoint::new(8.0, 0.0, 14.0, 2),
        LidarPoint::new(0.0, 8.0, 12.0, 2),
    ];
    let surface = TinSurface::from_points(pts).unwrap();
    let q = surface.query(2.0, 2.0);
    assert_eq!(q.triangle, Some(0));
    assert!((q.elevation.unwrap() - 11.5).abs() < 1e-12);
    assert!((q.slope.unwrap() - 100.0 * 0.3125f64.sqrt()).abs() < 1e-9);
    // Downhill is towards -x, -y: south-west.
    let aspect = q.aspect.unwrap();
    assert!((aspect - (180.0 + 0.5f64.atan2(0.25).to_degrees())).abs() < 1e-9);

    // Vertices and edges are inside; the far side of the hypotenuse is not.
    assert!((surface.elevation(8.0, 0.0).unwrap() - 14.0).abs() < 1e-12);
    assert!((surface.elevation(4.0, 4.0).unwrap() - 13.0).abs() < 1e-12);
    assert_eq!(surface.elevation(4.1, 4.1), None);
}

#[test]
fn level_surface_has_zero_slope_and_no_aspect() {
    let pts = vec![
        LidarPoint::new(0.0, 0.0, 3.0, 2),
        LidarPoint::new(5.0, 0.0, 3.0, 2),
        LidarPoint::new(5.0, 5.0, 3.0, 2),
        LidarPoint::new(0.0, 5.0, 3.0, 2),
    ];
    let surface = TinSurface::from_points(pts).unwrap();
    assert_eq!(surface.slope(1.0, 2.0), Some(0.0));
    assert_eq!(surface.aspect(1.0, 2.0), None);
    assert_eq!(surface.elevation(1.0, 2.0), Some(3.0));
}
