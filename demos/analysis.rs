//! Minimal end-to-end demo: enable tracking, write an output through the
//! crate's entry point, and list the sidecars that appear next to it.

use anyhow::Result;
use std::io::Write;

fn main() -> Result<()> {
    whichscript::enable_tracking();

    let out_dir = std::env::temp_dir().join("whichscript-demo");
    std::fs::create_dir_all(&out_dir)?;
    let output = out_dir.join("analysis.txt");

    let mut file = whichscript::create(&output)?;
    writeln!(file, "mean=4.2 n=17")?;
    drop(file);

    println!("output:  {}", output.display());
    for entry in std::fs::read_dir(&out_dir)? {
        let path = entry?.path();
        if path != output {
            println!("sidecar: {}", path.display());
        }
    }
    Ok(())
}
