use super::*;

#[test]
fn new_trend_is_empty() {
    let trend: Trend<f64> = Trend::new(3);
    assert!(trend.is_empty());
    assert_eq!(trend.capacity(), 3);
    assert!(trend.latest().is_none());
}

#[test]
fn zero_capacity_holds_one() {
    let mut trend = Trend::new(0);
    trend.push(1, 'a');
    trend.push(2, 'b');
    assert_eq!(trend.len(), 1);
    assert_eq!(trend.latest().map(|s| s.value), Some('b'));
}

#[test]
fn overflow_keeps_last_n() {
    let mut trend = Trend::new(30);
    for i in 0..=30 {
        trend.push(i, i);
    }
    assert_eq!(trend.len(), 30);
    let values: Vec<i64> = trend.iter().map(|s| s.value).collect();
    assert_eq!(values, (1..=30).collect::<Vec<_>>());
}

#[test]
fn never_exceeds_capacity() {
    let mut trend = Trend::new(5);
    for i in 0..100 {
        trend.push(i, ());
        assert!(trend.len() <= 5);
    }
}

#[test]
fn serializes_as_sample_array() {
    let mut trend = Trend::new(2);
    trend.push(10, 1.5);
    let value = serde_json::to_value(&trend).unwrap();
    assert_eq!(value, serde_json::json!([{"at": 10, "value": 1.5}]));
}
