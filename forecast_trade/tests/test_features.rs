use chrono::NaiveDate;
use forecast_trade::features::{CLOSE_COLUMN, WARMUP_ROWS};
use forecast_trade::windows::window_count;
use forecast_trade::{FeatureBuilder, MinMaxScaler, SequenceWindower, FEATURE_COLUMNS};
use market_data::{generate_bars, PriceBar};
use rstest::rstest;

fn bars(seed: u64, count: usize, volatility: f64) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
    generate_bars(seed, start, count, 80.0, volatility)
}

#[rstest]
#[case(1, 0.005)]
#[case(2, 0.02)]
#[case(3, 0.08)]
fn test_rsi_stays_bounded(#[case] seed: u64, #[case] volatility: f64) {
    let table = FeatureBuilder::new(1).build(&bars(seed, 300, volatility)).unwrap();
    let rsi = table.column("rsi").unwrap();
    assert!(rsi.iter().all(|v| (0.0..=100.0).contains(v)));
}

#[rstest]
#[case(134)]
#[case(200)]
#[case(451)]
fn test_windows_from_features(#[case] rows: usize) {
    let table = FeatureBuilder::new(134)
        .build(&bars(9, rows + WARMUP_ROWS, 0.02))
        .unwrap();
    assert_eq!(table.len(), rows);
    assert_eq!(table.values().ncols(), FEATURE_COLUMNS.len());

    let scaler = MinMaxScaler::fit(table.values()).unwrap();
    let scaled = scaler.transform(table.values()).unwrap();
    assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));

    let target_scaler = MinMaxScaler::fit_column(table.close()).unwrap();
    let target = target_scaler.transform_column(table.close()).unwrap();
    // the target scaler agrees with the close column of the full scaler
    for (a, b) in target.iter().zip(scaled.column(CLOSE_COLUMN)) {
        assert!((a - b).abs() < 1e-12);
    }

    let windows = SequenceWindower::new(60, 14)
        .unwrap()
        .windows(scaled.view(), target.view())
        .unwrap();
    assert_eq!(windows.len(), rows - 60 - 14 + 1);
    assert_eq!(windows.len(), window_count(rows, 60, 14));
    assert_eq!(windows.inputs().shape(), &[windows.len(), 60, FEATURE_COLUMNS.len()]);
}
