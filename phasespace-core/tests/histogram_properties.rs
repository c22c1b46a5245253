#![allow(clippy::cast_precision_loss)]
use approx::assert_relative_eq;
use phasespace_core::{
    split_scale, BinIndex, BinningConfig, Error, Histogram, Histogram1D, NonuniformHistogram,
    UniformHistogram,
};

fn both(edges: &[f64]) -> Vec<Histogram> {
    let n = edges.len() - 1;
    vec![
        UniformHistogram::new(n, edges[0], edges[n]).unwrap().into(),
        NonuniformHistogram::new(edges.to_vec()).unwrap().into(),
    ]
}

#[test]
fn test_edge_value_routes_to_upper_bin() {
    for mut h in both(&[0.0, 1.0, 2.0]) {
        assert_eq!(h.fill(1.0, 1.0), BinIndex::Bin(1));
        assert_eq!(h.fill(0.0, 1.0), BinIndex::Bin(0));
        assert_eq!(h.fill(2.0, 1.0), BinIndex::Overflow);
        assert_eq!(h.bin_at_offset(0).unwrap().events, 1);
        assert_eq!(h.bin_at_offset(1).unwrap().events, 1);
    }
}

#[test]
fn test_integral_includes_outliers() {
    for mut h in both(&[0.0, 1.0, 2.0]) {
        h.fill(0.5, 1.0);
        h.fill(-3.0, 2.0);
        h.fill(9.0, -1.0);

        assert_relative_eq!(h.integral(), 2.0);
        assert_eq!(h.nof_events(), 3);
        assert_relative_eq!(h.bin_at_offset(-1).unwrap().weight, 2.0);
        assert_relative_eq!(h.bin_at_offset(2).unwrap().weight, -1.0);
    }
}

#[test]
fn test_nonuniform_query() {
    let mut h = NonuniformHistogram::new(vec![0.01, 0.5, 1.0, 1.33]).unwrap();
    h.fill(0.75, 1.0);
    let bin = h.bin_at_offset(1).unwrap();
    assert_relative_eq!(bin.weight, 1.0);
    assert_eq!(bin.events, 1);
    assert_eq!(h.x(), &[0.01, 0.5, 1.0, 1.33]);
    assert_relative_eq!(h.lo(), 0.01);
    assert_relative_eq!(h.hi(), 1.33);
}

#[test]
fn test_invalid_configurations() {
    assert!(matches!(
        NonuniformHistogram::new(vec![1.0, 0.5, 2.0]),
        Err(Error::InvalidHistogramConfig(_))
    ));
    assert!(matches!(
        UniformHistogram::new(0, 0.0, 1.0),
        Err(Error::InvalidHistogramConfig(_))
    ));
    assert!(matches!(
        UniformHistogram::new(4, 1.0, 1.0),
        Err(Error::InvalidHistogramConfig(_))
    ));
}

#[test]
fn test_out_of_range_queries() {
    let h = UniformHistogram::new(3, 0.0, 3.0).unwrap();
    assert!(matches!(
        h.bin_at_offset(-2),
        Err(Error::IndexOutOfRange { index: -2, size: 3 })
    ));
    assert!(matches!(
        h.bin_at_offset(4),
        Err(Error::IndexOutOfRange { index: 4, size: 3 })
    ));
    assert!(h.bin_at_offset(3).is_ok());
}

#[test]
fn test_uniform_and_nonuniform_agree() {
    let edges: Vec<f64> = (0..=20).map(|i| f64::from(i) * 0.25).collect();
    let mut hists = both(&edges);
    for k in 0..500 {
        let value = -0.5 + (k as f64) * 0.0123;
        let weight = 1.0 + (k % 3) as f64;
        for h in &mut hists {
            h.fill(value, weight);
        }
    }

    let (a, b) = (&hists[0], &hists[1]);
    for bin in BinIndex::all(a.size()) {
        let (ca, cb) = (a.bin_at(bin).unwrap(), b.bin_at(bin).unwrap());
        assert_eq!(ca.events, cb.events, "{bin:?}");
        assert_relative_eq!(ca.weight, cb.weight);
    }
    assert_relative_eq!(a.integral(), b.integral());
}

#[test]
fn test_split_merge_equals_single_pass() {
    let config = BinningConfig::SplitScale {
        lo: 0.01,
        me: 1.170_001,
        hi: 1.330_001,
        fine_bins: 5,
    };
    let mut whole = config.build().unwrap();
    let mut first = whole.empty_like();
    let mut second = whole.empty_like();

    for k in 0..200 {
        let value = (k as f64) * 0.007;
        whole.fill(value, 0.5);
        if k % 2 == 0 {
            first.fill(value, 0.5);
        } else {
            second.fill(value, 0.5);
        }
    }
    first.merge(&second).unwrap();

    assert_eq!(first.nof_events(), whole.nof_events());
    assert_relative_eq!(first.integral(), whole.integral());
    for bin in BinIndex::all(whole.size()) {
        assert_eq!(
            first.bin_at(bin).unwrap().events,
            whole.bin_at(bin).unwrap().events
        );
    }

    let edges = split_scale(0.01, 1.170_001, 1.330_001, 5).unwrap();
    assert_eq!(whole.edges(), edges);
    assert!(matches!(
        whole.merge(&UniformHistogram::new(3, 0.0, 1.0).unwrap().into()),
        Err(Error::HistogramMismatch)
    ));
}
