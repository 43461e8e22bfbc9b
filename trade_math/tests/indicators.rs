use approx::assert_relative_eq;
use rstest::rstest;
use trade_math::series;
use trade_math::{
    BollingerBands, ExponentialMovingAverage, Macd, MathError, RateOfChange, RelativeStrengthIndex,
    SimpleMovingAverage,
};

fn zigzag(n: usize, amplitude: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 50.0 + (i as f64 * 1.3).sin() * amplitude + (i % 7) as f64 * 0.2)
        .collect()
}

#[rstest]
#[case::calm(zigzag(200, 0.1))]
#[case::wild(zigzag(200, 40.0))]
#[case::rising((1..=100).map(f64::from).collect())]
#[case::falling((1..=100).rev().map(f64::from).collect())]
#[case::flat(vec![42.0; 60])]
fn test_rsi_is_bounded(#[case] prices: Vec<f64>) {
    let rsi = series::rsi(&prices, 14).unwrap();
    for value in rsi.into_iter().flatten() {
        assert!((0.0..=100.0).contains(&value), "rsi out of range: {value}");
    }
}

#[test]
fn test_zero_periods_are_rejected() {
    assert!(matches!(SimpleMovingAverage::new(0), Err(MathError::InvalidInput(_))));
    assert!(ExponentialMovingAverage::new(0).is_err());
    assert!(RelativeStrengthIndex::new(0).is_err());
    assert!(RateOfChange::new(0).is_err());
    assert!(BollingerBands::new(1, 2.0).is_err());
    assert!(Macd::new(26, 12, 9).is_err());
}

#[test]
fn test_constant_series() {
    let prices = vec![10.0; 80];

    let ema = series::ema(&prices, 12).unwrap();
    assert!(ema.iter().all(|v| v.is_some_and(|x| (x - 10.0).abs() < 1e-12)));

    let macd = series::macd(&prices, 12, 26, 9).unwrap();
    assert_relative_eq!(macd.line[79].unwrap(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(macd.signal[79].unwrap(), 0.0, epsilon = 1e-12);

    let bands = series::bollinger(&prices, 20, 2.0).unwrap();
    assert_relative_eq!(bands.width[79].unwrap(), 0.0);
    assert_relative_eq!(bands.upper[79].unwrap(), 10.0);

    let returns = series::pct_change(&prices, 5).unwrap();
    assert_eq!(returns[79], Some(0.0));
}

#[test]
fn test_first_complete_row_of_feature_set() {
    let prices = zigzag(120, 3.0);
    let rsi = series::rsi(&prices, 14).unwrap();
    let sma50 = series::sma(&prices, 50).unwrap();
    let ret10 = series::pct_change(&prices, 10).unwrap();

    assert_eq!(series::first_complete_row(&[&rsi, &ret10]), Some(14));
    assert_eq!(series::first_complete_row(&[&rsi, &sma50, &ret10]), Some(49));
    assert_eq!(series::first_complete_row(&[]), None);
}
