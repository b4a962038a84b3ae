use std::io::Write;

pub fn line(message: impl AsRef<str>) {
    println!("{}", message.as_ref());
}

/// Writes `text` to stdout exactly as given, so redirected dumps stay
/// byte-identical to what `--output` would write.
pub fn raw(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

pub fn error(message: impl AsRef<str>) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", message.as_ref());
}
