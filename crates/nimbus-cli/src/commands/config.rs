use anyhow::Result;
use std::path::Path;

use nimbus_core::config::NimbusConfig;

fn show(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn secret(value: &Option<String>) -> &str {
    if value.is_some() { "[set]" } else { "-" }
}

pub fn run(base_dir: &Path) -> Result<()> {
    let config_path = NimbusConfig::default_path(base_dir);
    let mut config = NimbusConfig::load(&config_path)?;
    config.storage.apply_env()?;
    let s = &config.storage;

    println!("Config: {}", config_path.display());
    println!();
    println!("  Provider:       {}", s.provider);
    println!("  Bucket:         {}", s.bucket_name);
    println!("  Region:         {}", show(&s.region));
    println!("  Endpoint:       {}", show(&s.endpoint));

    match s.provider_type() {
        Ok(nimbus_core::types::ProviderType::Oci) => {
            println!("  User OCID:      {}", show(&s.user_ocid));
            println!("  Tenancy OCID:   {}", show(&s.tenancy_ocid));
            println!("  Fingerprint:    {}", show(&s.fingerprint));
            println!("  Key file:       {}", show(&s.key_file));
        }
        Ok(nimbus_core::types::ProviderType::Azure) => {
            println!("  Account:        {}", show(&s.account));
            println!("  Account key:    {}", secret(&s.access_key));
        }
        Ok(nimbus_core::types::ProviderType::Local) => {
            println!("  Root:           {}", show(&s.root));
        }
        Ok(_) => {
            println!("  Access key:     {}", secret(&s.access_key));
            println!("  Secret key:     {}", secret(&s.secret_key));
            println!("  Path style:     {:?}", s.path_style);
        }
        Err(e) => println!("  ! {e}"),
    }

    Ok(())
}
