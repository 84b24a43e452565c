use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "galcache")]
#[command(version)]
#[command(about = "Maintenance tool for the gallery decompression cache", long_about = None)]
#[command(after_help = "Examples:\n  \
  galcache read library/sample.cbz 11111111-1111-4111-8111-111111111111\n  \
  galcache prune                 evict entries idle past the configured TTL\n  \
  galcache prune --fs            offline prune trusting filesystem timestamps\n  \
  galcache list                  show adopted cache entries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the read path once: extract on demand and print the page list
    Read {
        /// Path to the gallery archive (or plain image directory)
        #[arg(value_name = "ARCHIVE")]
        archive: String,

        /// Gallery UUID (doubles as the cache directory name)
        #[arg(value_name = "UUID")]
        gallery: String,
    },

    /// Run one eviction pass over the cache
    Prune {
        /// Trust filesystem timestamps instead of the in-memory store.
        /// Offline maintenance only; bypasses the per-gallery locks.
        #[arg(long)]
        fs: bool,
    },

    /// List cache entries adopted from disk with their last-access age
    List,
}
