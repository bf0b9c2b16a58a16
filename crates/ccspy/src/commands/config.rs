use crate::settings::Settings;
use ccspy_transcript::Paths;

pub fn run(init: bool) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let path = paths.settings_file();

    if init {
        if path.exists() {
            println!("Settings file already exists: {}", path.display());
        } else {
            Settings::default().save(&path)?;
            println!("Wrote default settings to {}", path.display());
        }
    }

    let settings = Settings::load(&path)?;
    println!("Settings file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
