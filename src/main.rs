use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use imagetree::model::{ChatAction, GenerationResponse, NodeKind};
use imagetree::remote::{ImageSource, RemoteClient};
use imagetree::tree::outline;

#[derive(Parser)]
#[command(name = "imagetree")]
#[command(about = "Client for an imagetree server", long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "IMAGETREE_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the derivation tree
    Tree {
        /// Include children of collapsed nodes
        #[arg(long)]
        all: bool,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List gallery images, newest first
    Images,

    /// Generate four images from a prompt
    Generate { prompt: String },

    /// Edit a gallery image (or a local file with --file)
    Edit {
        image: String,
        /// Treat IMAGE as a local file to upload
        #[arg(long)]
        file: bool,
        /// Editing preset (enhance, blur, vintage, black_white, artistic, cartoon)
        #[arg(long)]
        preset: Option<String>,
        /// Extra instructions
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Apply a theme to a gallery image (or a local file with --file)
    Themify {
        image: String,
        #[arg(long)]
        file: bool,
        /// Theme description
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Merge two images
    Merge {
        first: String,
        second: String,
        /// Treat both operands as local files to upload
        #[arg(long)]
        file: bool,
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Talk to the assistant, optionally about a selected gallery image
    Chat {
        message: String,
        #[arg(long)]
        image: Option<String>,
    },

    /// Expand or collapse a tree node
    Toggle { id: String },

    /// Attach existing gallery images under a tree node
    AddChildren {
        parent: String,
        #[arg(required = true)]
        images: Vec<String>,
        /// Node type (original, edit, themify)
        #[arg(long = "type", default_value = "edit")]
        kind: NodeKind,
        #[arg(long)]
        prompt: Option<String>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn source(name: &str, upload: bool) -> ImageSource<'_> {
    if upload {
        ImageSource::Upload(Path::new(name))
    } else {
        ImageSource::Gallery(name)
    }
}

fn print_generation(resp: &GenerationResponse) {
    if let Some(theme) = &resp.theme {
        println!("theme: {}", theme);
    }
    if let Some(prompt) = &resp.merge_prompt {
        println!("merge prompt: {}", prompt);
    }
    println!("generated {} image(s)", resp.count);
    for image in &resp.images {
        println!("  {}", image);
    }
    if let Some(err) = &resp.tree_error {
        eprintln!("warning: images were not recorded in the tree: {}", err);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = RemoteClient::new(&cli.server)?;

    match cli.command {
        Commands::Tree { all, json } => {
            let tree = client.tree()?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&tree).context("serialize tree json")?
                );
            } else if tree.tree.is_empty() {
                println!("(empty tree)");
            } else {
                print!("{}", outline(&tree.tree, all));
            }
        }
        Commands::Images => {
            for image in client.images()? {
                println!("{}", image);
            }
        }
        Commands::Generate { prompt } => {
            print_generation(&client.generate(&prompt)?);
        }
        Commands::Edit {
            image,
            file,
            preset,
            prompt,
        } => {
            let resp = client.edit(source(&image, file), preset.as_deref(), prompt.as_deref())?;
            print_generation(&resp);
        }
        Commands::Themify {
            image,
            file,
            prompt,
        } => {
            let resp = client.themify(source(&image, file), prompt.as_deref())?;
            print_generation(&resp);
        }
        Commands::Merge {
            first,
            second,
            file,
            prompt,
        } => {
            let resp = client.merge(
                source(&first, file),
                source(&second, file),
                prompt.as_deref(),
            )?;
            print_generation(&resp);
        }
        Commands::Chat { message, image } => {
            let resp = client.chat(&message, image.as_deref())?;
            println!("{}", resp.response);
            if resp.action == ChatAction::Generate {
                for image in &resp.images {
                    println!("  {}", image);
                }
            }
            if let Some(err) = &resp.tree_error {
                eprintln!("warning: images were not recorded in the tree: {}", err);
            }
        }
        Commands::Toggle { id } => {
            let m = client.toggle(&id)?;
            if m.applied {
                println!("toggled {}", id);
            } else {
                anyhow::bail!("no node named {}", id);
            }
        }
        Commands::AddChildren {
            parent,
            images,
            kind,
            prompt,
        } => {
            let m = client.add_children(&parent, &images, kind, prompt.as_deref())?;
            if !m.applied {
                anyhow::bail!("no node named {}", parent);
            }
            println!("added {} {} image(s) under {}", images.len(), kind, parent);
        }
    }

    Ok(())
}
