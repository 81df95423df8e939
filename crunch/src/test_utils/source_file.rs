use std::path::Path;

use tempfile::NamedTempFile;

/// A results file in the system temporary directory, removed when dropped.
#[derive(Debug)]
pub struct TestSourceFile {
    file: NamedTempFile,
}

impl TestSourceFile {
    /// Writes `contents` verbatim to a new uniquely named file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub async fn new(contents: &str) -> Self {
        let file = tempfile::Builder::new()
            .prefix("crunch_source_")
            .suffix(".txt")
            .tempfile()
            .expect("Failed to create the source file");
        tokio::fs::write(file.path(), contents)
            .await
            .expect("Failed to write the source file");

        Self { file }
    }

    /// Writes one line per entry, each terminated by a newline.
    pub async fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut contents = String::new();
        for line in lines {
            contents.push_str(line.as_ref());
            contents.push('\n');
        }

        Self::new(&contents).await
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Builds a well formed result line for `index` with a distinct address.
///
/// The address starts with exactly `leading` zero bytes, then `ff` and the index in hex.
pub fn result_line(index: u64, leading: usize, reward: u64) -> String {
    format!("salt{index} => 0x{}ff{index:08x} => {reward}", "00".repeat(leading))
}
