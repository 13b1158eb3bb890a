//! Command-line argument definitions for the umlcanvas CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the configuration file and the
//! logging verbosity; the [`Command`] picks what to do.

use clap::{Parser, Subcommand};

/// Command-line arguments for the umlcanvas class-diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a diagram (JSON) or class listing to SVG
    Render {
        /// Diagram JSON file, or a class listing (any other extension)
        input: String,

        /// Path to the output SVG file
        #[arg(short, long, default_value = "out.svg")]
        output: String,
    },

    /// Convert a class listing into diagram JSON
    Import {
        /// Path to the class listing
        input: String,

        /// Path to the output JSON file
        #[arg(short, long, default_value = "diagram.json")]
        output: String,
    },

    /// Generate classes from a prompt with the configured language model
    Generate {
        /// What to add to the diagram
        prompt: String,

        /// Existing diagram to extend
        #[arg(short, long)]
        diagram: Option<String>,

        /// Path to the output JSON file
        #[arg(short, long, default_value = "diagram.json")]
        output: String,
    },

    /// Generate a Spring Boot project from a diagram
    Export {
        /// Diagram JSON file
        input: String,

        /// Path to the output zip archive
        #[arg(short, long, default_value = "project.zip")]
        output: String,

        /// Project name; defaults to the diagram name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Start the HTTP service
    Serve {
        /// Port to listen on; overrides configuration and `PORT`
        #[arg(short, long)]
        port: Option<u16>,
    },
}
