// Setup function that is safe to call from every test, even concurrently
pub fn setup() {
    let _ = tracing_subscriber::fmt::try_init();
}
