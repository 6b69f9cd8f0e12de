use super::GlobalArgs;
use nexus_cli::core::{NexusError, NexusResult};
use nexus_cli::deps::env::write_env_file;
use nexus_cli::deps::template::create_template;
use nexus_cli::deps::{
    parse_manifest_file, LockFile, Resolver, SyncOptions, Syncer, ENV_FILE, LOCK_FILE,
    MANIFEST_FILE,
};
use nexus_cli::nexus::{ClientFactory, HttpClientFactory};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn current_dir() -> NexusResult<PathBuf> {
    env::current_dir()
        .map_err(|e| NexusError::Path(format!("Failed to get current directory: {}", e)))
}

pub fn init(global: &GlobalArgs) -> NexusResult<()> {
    init_in(&current_dir()?, global)
}

pub fn init_in(dir: &Path, global: &GlobalArgs) -> NexusResult<()> {
    let path = dir.join(MANIFEST_FILE);
    create_template(&path)?;
    if !global.quiet {
        println!("✓ Created {}", MANIFEST_FILE);
    }
    Ok(())
}

pub async fn lock(global: &GlobalArgs) -> NexusResult<()> {
    let config = global.config()?;
    let clients = Arc::new(HttpClientFactory::new(&config.username, &config.password));
    lock_in(&current_dir()?, global, clients, &config.url).await
}

pub async fn lock_in(
    dir: &Path,
    global: &GlobalArgs,
    clients: Arc<dyn ClientFactory>,
    default_url: &str,
) -> NexusResult<()> {
    let manifest = parse_manifest_file(&dir.join(MANIFEST_FILE))?;
    let lock = Resolver::new(clients, default_url)
        .verbose(!global.quiet)
        .resolve_manifest(&manifest)
        .await?;

    lock.save(&dir.join(LOCK_FILE))?;
    if !global.quiet {
        println!();
        println!(
            "✓ Wrote {} ({} dependencies, {} files)",
            LOCK_FILE,
            lock.dependencies.len(),
            lock.total_files()
        );
    }
    Ok(())
}

pub async fn sync(global: &GlobalArgs, no_cleanup: bool) -> NexusResult<()> {
    let config = global.config()?;
    let clients = Arc::new(HttpClientFactory::new(&config.username, &config.password));
    let options = SyncOptions {
        cleanup: !no_cleanup,
        quiet: global.quiet,
        show_progress: global.show_progress(),
        max_concurrent: config.max_concurrent,
    };
    sync_in(&current_dir()?, global, Syncer::new(clients, &config.url, options)).await
}

pub async fn sync_in(dir: &Path, global: &GlobalArgs, syncer: Syncer) -> NexusResult<()> {
    let manifest = parse_manifest_file(&dir.join(MANIFEST_FILE))?;
    let lock_path = dir.join(LOCK_FILE);
    if !lock_path.exists() {
        return Err(NexusError::Manifest(format!(
            "{} not found, run 'deps lock' first",
            LOCK_FILE
        )));
    }
    let lock = LockFile::load(&lock_path)?;

    let report = syncer.sync(&manifest, &lock, dir).await?;
    if !global.quiet {
        println!();
        println!(
            "✓ Synced {} dependencies ({} files verified, {} removed)",
            report.dependencies, report.verified, report.deleted
        );
    }
    Ok(())
}

pub fn env(global: &GlobalArgs) -> NexusResult<()> {
    env_in(&current_dir()?, global)
}

pub fn env_in(dir: &Path, global: &GlobalArgs) -> NexusResult<()> {
    let manifest = parse_manifest_file(&dir.join(MANIFEST_FILE))?;
    write_env_file(&dir.join(ENV_FILE), &manifest)?;
    if !global.quiet {
        println!("✓ Wrote {}", ENV_FILE);
    }
    Ok(())
}
