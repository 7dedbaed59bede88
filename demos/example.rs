use dragon_cfg::tables::Settings;
use dragon_cfg::{Config, Node};

fn main() -> Result<(), dragon_cfg::Error> {
    // Validate once at build time
    let settings: Settings = Config::builder()
        .with_file("demos/settings.yaml", true)
        .with_file("demos/local.yaml", false)
        .with_env("DRAGON", "__")
        .build()?;

    for table in settings.input_tables() {
        println!(
            "{} <- {} (index {})",
            table.tablename().unwrap_or("?"),
            table.filename().unwrap_or("?"),
            table.index_col().unwrap_or("?"),
        );
    }

    // Trees can also be built up ad hoc and printed back out
    let scratch = Node::new();
    scratch.child("output")?.set("dir", "out/")?;
    println!("{scratch}");

    Ok(())
}
