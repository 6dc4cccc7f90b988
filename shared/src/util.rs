/// Current UTC timestamp in milliseconds.
///
/// All persisted timestamps (`erstellt_am`, `geaendert_am`) use this
/// representation; the shared warehouse schema stores BIGINT millis.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
