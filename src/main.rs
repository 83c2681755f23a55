use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use payment_slip::config::{
    FORM_FILE_NAME, load_form_draft, load_settings_or_default, write_form_draft,
};
use payment_slip::form::{FormDraft, InvoiceForm};
use payment_slip::pdf::{AssetSet, find_unicode_font, render_payment_slip, save_payment_slip};

/// Generate a payment slip PDF from a filled-in invoice form.
#[derive(Parser, Debug)]
#[command(name = "payment_slip")]
#[command(about = "Generate a payment slip PDF from a filled-in invoice form.", long_about = None)]
struct Args {
    /// Target directory containing form.json, the assets directory and an
    /// optional settings.json. payment-slip.pdf will be saved in this directory
    #[arg(short, long, default_value = ".")]
    target_dir: PathBuf,

    /// Write a blank form.json with the default line items instead of rendering
    #[arg(long)]
    init: bool,
}

fn init_form(target_dir: &Path) -> Result<()> {
    let form_path = target_dir.join(FORM_FILE_NAME);
    if form_path.exists() {
        return Err(anyhow!("{:?} already exists, not overwriting it", form_path));
    }
    let form = InvoiceForm::new();
    write_form_draft(&form_path, &FormDraft::template(&form))?;
    info!("Wrote {:?}", form_path);
    Ok(())
}

fn generate(target_dir: &Path) -> Result<()> {
    let form_path = target_dir.join(FORM_FILE_NAME);
    if !form_path.exists() {
        return Err(anyhow!(
            "Required file not found: {:?} (run with --init to create one)",
            form_path
        ));
    }

    info!("Loading settings...");
    let settings = load_settings_or_default(target_dir)?;

    info!("Loading {}...", FORM_FILE_NAME);
    let draft = load_form_draft(&form_path)?;
    let mut form = InvoiceForm::new();
    form.apply_draft(draft);

    let record = match form.submit() {
        Ok(record) => record,
        Err(errors) => {
            for field_error in &errors.errors {
                error!("{}", field_error);
            }
            return Err(errors.into());
        }
    };
    info!(
        "Order {} for {} with {} item(s)",
        record.order_no,
        record.client_name,
        record.items.len()
    );

    let assets_dir = settings.assets_dir(target_dir);
    info!("Loading images from {:?}...", assets_dir);
    let assets = AssetSet::load_dir(&assets_dir)?;

    let unicode_font = if record.needs_unicode_font() {
        let font = find_unicode_font(settings.unicode_font.as_deref());
        match &font {
            Some(font) => info!("Using {} for text outside WinAnsi", font.name),
            None => {
                warn!("No Unicode font found, characters outside WinAnsi will print as '?'")
            }
        }
        font
    } else {
        None
    };

    info!("Generating payment slip...");
    let mut slip = render_payment_slip(&record, &assets, unicode_font.as_ref())
        .with_context(|| "Failed to render payment slip")?;
    save_payment_slip(&mut slip, target_dir)?;

    Ok(())
}

fn run(args: Args) -> Result<()> {
    let target_dir = args.target_dir;
    if !target_dir.exists() {
        return Err(anyhow!("Target directory not found: {:?}", target_dir));
    }
    if !target_dir.is_dir() {
        return Err(anyhow!("Target path is not a directory: {:?}", target_dir));
    }

    if args.init {
        init_form(&target_dir)
    } else {
        generate(&target_dir)
    }
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
