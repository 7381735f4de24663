use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use measureon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(name = "measureon")]
struct Cli {
    /// Shop configuration file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = "measureon.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a new order
    Add(AddArgs),
    /// List orders, newest last
    List {
        /// Match against order number or customer number
        #[arg(long, default_value = "")]
        search: String,
        /// all, undelivered or starred
        #[arg(long, default_value = "all")]
        filter: OrderFilter,
        #[arg(long)]
        json: bool,
    },
    /// Show one order with its measurements
    Show { order_number: i64 },
    /// Mark an order ready and notify the customer
    Ready { order_number: i64 },
    /// Mark an order delivered and notify the customer
    Deliver { order_number: i64 },
    /// Change the editable fields of an order
    Edit(EditArgs),
    Star { order_number: i64 },
    Unstar { order_number: i64 },
    Delete { order_number: i64 },
    /// Counts and revenue, overall or for one month
    Summary {
        #[arg(long, requires = "year")]
        month: Option<u32>,
        #[arg(long, requires = "month")]
        year: Option<i32>,
    },
    /// Show or change garment prices
    Prices {
        #[command(subcommand)]
        action: PricesCommand,
    },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    customer: String,
    /// Delivery date as year-month-day
    #[arg(long)]
    delivery_date: String,
    #[arg(long, default_value_t = 0)]
    shirts: u32,
    #[arg(long, default_value_t = 0)]
    pants: u32,
    #[arg(long, default_value_t = 0)]
    shorts: u32,
    #[arg(long, default_value = "")]
    shirt_measurement: String,
    #[arg(long, default_value = "")]
    pant_measurement: String,
    #[arg(long, default_value = "")]
    short_measurement: String,
    #[arg(long)]
    starred: bool,
    #[arg(long)]
    image: Option<String>,
}

#[derive(Args)]
struct EditArgs {
    order_number: i64,
    #[arg(long)]
    shirts: Option<u32>,
    #[arg(long)]
    pants: Option<u32>,
    #[arg(long)]
    shorts: Option<u32>,
    #[arg(long)]
    delivery_date: Option<String>,
    #[arg(long)]
    ready: Option<bool>,
    #[arg(long)]
    delivered: Option<bool>,
    #[arg(long)]
    starred: Option<bool>,
    #[arg(long, conflicts_with = "clear_image")]
    image: Option<String>,
    #[arg(long)]
    clear_image: bool,
    #[arg(long)]
    shirt_measurement: Option<String>,
    #[arg(long)]
    pant_measurement: Option<String>,
    #[arg(long)]
    short_measurement: Option<String>,
}

impl EditArgs {
    fn apply_to(self, edit: &mut OrderEdit) {
        if let Some(shirts) = self.shirts {
            edit.shirts = shirts;
        }
        if let Some(pants) = self.pants {
            edit.pants = pants;
        }
        if let Some(shorts) = self.shorts {
            edit.shorts = shorts;
        }
        if let Some(date) = self.delivery_date {
            edit.delivery_date = date;
        }
        if let Some(ready) = self.ready {
            edit.is_ready = ready;
        }
        if let Some(delivered) = self.delivered {
            edit.is_delivered = delivered;
        }
        if let Some(starred) = self.starred {
            edit.is_starred = starred;
        }
        if self.clear_image {
            edit.image_uri = None;
        } else if let Some(image) = self.image {
            edit.image_uri = Some(image);
        }
        if let Some(m) = self.shirt_measurement {
            edit.measurements.shirt = m;
        }
        if let Some(m) = self.pant_measurement {
            edit.measurements.pant = m;
        }
        if let Some(m) = self.short_measurement {
            edit.measurements.short = m;
        }
    }
}

#[derive(Subcommand)]
enum PricesCommand {
    Show,
    Set {
        #[arg(long)]
        shirt: Option<f64>,
        #[arg(long)]
        pant: Option<f64>,
        #[arg(long)]
        short: Option<f64>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_order(order: &Order) {
    let m = order.measurements();
    println!("Order #{}", order.order_number);
    println!("  customer:       {}", order.customer_number);
    println!("  delivery date:  {}", order.delivery_date);
    println!(
        "  garments:       {} shirts, {} pants, {} shorts",
        order.shirts, order.pants, order.shorts
    );
    println!("  total price:    {:.2}", order.total_price);
    println!("  status:         {}", order.status);
    println!(
        "  flags:          starred={} ready={} delivered={}",
        order.is_starred, order.is_ready, order.is_delivered
    );
    println!("  shirt:          {}", m.shirt);
    println!("  pant:           {}", m.pant);
    println!("  short:          {}", m.short);
    if let Some(image) = &order.image_uri {
        println!("  image:          {}", image);
    }
}

fn print_row(order: &Order) {
    println!(
        "{:>6}  {:<16} {:<12} {:<10} {:>10.2}{}",
        order.order_number,
        order.customer_number,
        order.delivery_date,
        order.status,
        order.total_price,
        if order.is_starred { "  *" } else { "" }
    );
}

async fn require(repo: &OrderRepository, order_number: i64) -> Result<Order> {
    repo.get_by_id(order_number)
        .await
        .ok_or_else(|| anyhow!("Order #{} not found", order_number))
}

/// Apply a status change while the notification dispatcher listens
async fn change_status(
    store: Arc<dyn OrderStore>,
    config: &ShopConfig,
    order_number: i64,
    status: OrderStatus,
) -> Result<()> {
    let events = EventBus::default();
    let stream = events.stream();
    let repo = OrderRepository::with_event_bus(store, events);

    let dispatcher =
        NotificationDispatcher::from_config(Arc::new(LogNotifier), &config.notifications);
    let dispatch = tokio::spawn(async move { dispatcher.run(stream).await });

    require(&repo, order_number).await?;
    repo.update_status(order_number, status).await;
    let current = repo.status_of(order_number).await;

    // Closing the bus ends the dispatcher once it has drained
    drop(repo);
    let sent = dispatch.await.context("Notification dispatcher failed")?;

    println!(
        "Order #{} is {} ({} notification(s) sent)",
        order_number, current, sent
    );
    Ok(())
}

async fn set_starred(repo: &OrderRepository, order_number: i64, starred: bool) -> Result<()> {
    let order = require(repo, order_number).await?;
    let mut edit = OrderEdit::from(&order);
    edit.is_starred = starred;
    repo.update_fields(order_number, edit).await;
    Ok(())
}

fn prices(action: PricesCommand, mut config: ShopConfig, path: &Path) -> Result<()> {
    match action {
        PricesCommand::Show => {
            let p = config.pricing;
            println!("shirt: {:.2}", p.shirt_price);
            println!("pant:  {:.2}", p.pant_price);
            println!("short: {:.2}", p.short_price);
        }
        PricesCommand::Set { shirt, pant, short } => {
            if let Some(price) = shirt {
                config.pricing.shirt_price = price;
            }
            if let Some(price) = pant {
                config.pricing.pant_price = price;
            }
            if let Some(price) = short {
                config.pricing.short_price = price;
            }
            config.pricing.validate()?;
            config.save_yaml_file(path)?;
            println!("Prices saved to {}", path.display());
        }
    }
    Ok(())
}

async fn run(command: Commands, config: &ShopConfig, config_path: &Path) -> Result<()> {
    let store: Arc<dyn OrderStore> =
        Arc::new(SqliteOrderStore::connect(&config.database.url).await?);
    let repo = OrderRepository::new(store.clone());

    match command {
        Commands::Add(args) => {
            let draft = OrderDraft {
                customer_number: args.customer,
                delivery_date: args.delivery_date,
                shirts: args.shirts,
                pants: args.pants,
                shorts: args.shorts,
                measurements: Measurements::new(
                    args.shirt_measurement,
                    args.pant_measurement,
                    args.short_measurement,
                ),
                is_starred: args.starred,
                image_uri: args.image,
            };
            let order = repo.place_order(draft, &config.pricing).await?;
            println!(
                "Order #{} placed, total {:.2}",
                order.order_number, order.total_price
            );
        }
        Commands::List {
            search,
            filter,
            json,
        } => {
            let orders = OrderQuery::new(search, filter).apply(&repo.get_all().await);
            if json {
                println!("{}", serde_json::to_string_pretty(&orders)?);
            } else {
                for order in &orders {
                    print_row(order);
                }
            }
        }
        Commands::Show { order_number } => {
            print_order(&require(&repo, order_number).await?);
        }
        Commands::Ready { order_number } => {
            change_status(store, config, order_number, OrderStatus::Ready).await?;
        }
        Commands::Deliver { order_number } => {
            change_status(store, config, order_number, OrderStatus::Delivered).await?;
        }
        Commands::Edit(args) => {
            let order_number = args.order_number;
            let order = require(&repo, order_number).await?;
            let mut edit = OrderEdit::from(&order);
            args.apply_to(&mut edit);
            repo.update_fields(order_number, edit).await;
            print_order(&require(&repo, order_number).await?);
        }
        Commands::Star { order_number } => set_starred(&repo, order_number, true).await?,
        Commands::Unstar { order_number } => set_starred(&repo, order_number, false).await?,
        Commands::Delete { order_number } => {
            repo.delete(order_number).await;
            println!("Order #{} deleted", order_number);
        }
        Commands::Summary { month, year } => {
            let orders = repo.get_all().await;
            let summary = match (month, year) {
                (Some(month), Some(year)) => DashboardSummary::for_month(
                    &orders,
                    MonthYear::new(month, year),
                    &config.pricing,
                ),
                _ => DashboardSummary::compute(&orders, &config.pricing),
            };
            println!("total orders:    {}", summary.total_orders);
            println!("delivered:       {}", summary.delivered);
            println!("ready:           {}", summary.ready);
            println!("pending:         {}", summary.pending);
            println!(
                "garments out:    {} shirts, {} pants, {} shorts",
                summary.shirts_delivered, summary.pants_delivered, summary.shorts_delivered
            );
            println!("revenue:         {:.2}", summary.revenue);
        }
        Commands::Prices { action } => prices(action, config.clone(), config_path)?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ShopConfig::load_or_default(&cli.config)?;
    config.apply_env_overrides();

    match cli.command {
        Commands::Prices { action } => prices(action, config, &cli.config),
        command => run(command, &config, &cli.config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit_args(args: &[&str]) -> EditArgs {
        let argv: Vec<&str> = ["measureon", "edit"]
            .into_iter()
            .chain(args.iter().copied())
            .collect();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Edit(args) => args,
            _ => panic!("expected the edit command"),
        }
    }

    fn current() -> OrderEdit {
        OrderEdit {
            shirts: 2,
            pants: 1,
            shorts: 0,
            delivery_date: "2024-3-15".to_string(),
            is_ready: false,
            is_delivered: false,
            is_starred: true,
            image_uri: Some("content://media/1".to_string()),
            measurements: Measurements::new("40", "34", ""),
        }
    }

    #[test]
    fn test_edit_changes_only_given_flags() {
        let mut edit = current();
        edit_args(&["7", "--pants", "3", "--ready", "true", "--pant-measurement", "36"])
            .apply_to(&mut edit);

        assert_eq!(edit.pants, 3);
        assert!(edit.is_ready);
        assert_eq!(edit.measurements.pant, "36");

        assert_eq!(edit.shirts, 2);
        assert_eq!(edit.delivery_date, "2024-3-15");
        assert!(edit.is_starred);
        assert_eq!(edit.image_uri.as_deref(), Some("content://media/1"));
        assert_eq!(edit.measurements.shirt, "40");
    }

    #[test]
    fn test_edit_without_flags_keeps_everything() {
        let mut edit = current();
        edit_args(&["7"]).apply_to(&mut edit);
        assert_eq!(edit, current());
    }

    #[test]
    fn test_edit_image_replaces_and_clears() {
        let mut edit = current();
        edit_args(&["7", "--image", "content://media/2"]).apply_to(&mut edit);
        assert_eq!(edit.image_uri.as_deref(), Some("content://media/2"));

        edit_args(&["7", "--clear-image"]).apply_to(&mut edit);
        assert_eq!(edit.image_uri, None);
    }

    #[test]
    fn test_edit_rejects_image_with_clear_image() {
        let result = Cli::try_parse_from([
            "measureon",
            "edit",
            "7",
            "--image",
            "content://media/2",
            "--clear-image",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_clear_image_wins_over_image() {
        let args = EditArgs {
            image: Some("content://media/2".to_string()),
            clear_image: true,
            ..edit_args(&["7"])
        };

        let mut edit = current();
        args.apply_to(&mut edit);
        assert_eq!(edit.image_uri, None);
    }
}
