use agendastore::{
    Appointment, Contact, DateKey, DayView, NewAppointment, NewContact, NewTask, Store, Task,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Personal organizer: contacts, appointments and tasks kept in a local store")]
#[command(version)]
struct Cli {
    /// Path to the store directory (default: <data dir>/agenda)
    #[arg(short, long, env = "AGENDA_STORE")]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage contacts
    #[command(subcommand)]
    Contact(ContactCommand),

    /// Manage appointments
    #[command(subcommand)]
    Appointment(AppointmentCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Show appointments and tasks of a day (default: today)
    Day { date: Option<String> },

    /// Show the Monday-to-Sunday week containing a date (default: today)
    Week { date: Option<String> },
}

#[derive(Subcommand)]
enum ContactCommand {
    Add(ContactFields),
    List,
    Show { id: String },
    /// Change a contact; omitted fields keep their current value
    Edit {
        id: String,
        #[command(flatten)]
        fields: ContactEdit,
    },
    Delete { id: String },
}

#[derive(Args)]
struct ContactFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(Args)]
struct ContactEdit {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum AppointmentCommand {
    Add {
        /// Day of the appointment (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Person involved; repeat for several
        #[arg(long = "subject")]
        subjects: Vec<String>,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List appointments, optionally only those of one day
    List {
        #[arg(long)]
        date: Option<String>,
    },
    /// Change an appointment; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Replaces the subject list when given
        #[arg(long = "subject")]
        subjects: Vec<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
enum TaskCommand {
    Add {
        /// Due day (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List tasks, optionally only those of one day
    List {
        #[arg(long)]
        date: Option<String>,
    },
    /// Change a task; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a task as finished
    Done { id: String },
    /// Mark a task as pending again
    Undo { id: String },
    Delete { id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store_path = match cli.store_path {
        Some(path) => path,
        None => default_store_path()?,
    };
    let store = Store::open(&store_path).with_context(|| format!("Could not open store at {}", store_path.display()))?;

    match cli.command {
        Commands::Contact(cmd) => run_contact(&store, cmd),
        Commands::Appointment(cmd) => run_appointment(&store, cmd),
        Commands::Task(cmd) => run_task(&store, cmd),
        Commands::Day { date } => {
            let day = store.day(date_or_today(date)?).context("Could not load the day")?;
            print_day(&day);
            Ok(())
        }
        Commands::Week { date } => {
            let week = store.week(date_or_today(date)?).context("Could not load the week")?;
            for day in &week {
                print_day(day);
            }
            Ok(())
        }
    }
}

fn default_store_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("agenda"))
        .ok_or_else(|| eyre!("No data directory on this system; pass --store-path"))
}

fn date_or_today(date: Option<String>) -> Result<DateKey> {
    match date {
        Some(d) => Ok(DateKey::parse(&d)?),
        None => Ok(DateKey::today()),
    }
}

fn run_contact(store: &Store, cmd: ContactCommand) -> Result<()> {
    match cmd {
        ContactCommand::Add(fields) => {
            let contact = store
                .create_contact(NewContact {
                    name: fields.name,
                    phone: fields.phone,
                    email: fields.email,
                    address: fields.address,
                    notes: fields.notes,
                })
                .context("Could not save the contact")?;
            println!("Contact saved ({})", contact.id);
        }
        ContactCommand::List => {
            let contacts: Vec<Contact> = store.list_or_empty().context("Could not load contacts")?;
            if contacts.is_empty() {
                println!("No contacts.");
            }
            for contact in &contacts {
                println!("{}  {}  {}  {}", contact.id.dimmed(), contact.name.bold(), contact.phone, contact.email);
            }
        }
        ContactCommand::Show { id } => {
            let contact: Contact = store
                .get(&id)
                .context("Could not load contacts")?
                .ok_or_else(|| eyre!("No contact with id {}", id))?;
            println!("{}", contact.name.bold());
            println!("  Phone:   {}", contact.phone);
            println!("  Email:   {}", contact.email);
            println!("  Address: {}", contact.address);
            println!("  Notes:   {}", contact.notes);
        }
        ContactCommand::Edit { id, fields } => {
            let current: Contact = store
                .get(&id)
                .context("Could not load contacts")?
                .ok_or_else(|| eyre!("No contact with id {}", id))?;
            store
                .edit_contact(
                    &id,
                    NewContact {
                        name: fields.name.unwrap_or(current.name),
                        phone: fields.phone.unwrap_or(current.phone),
                        email: fields.email.unwrap_or(current.email),
                        address: fields.address.unwrap_or(current.address),
                        notes: fields.notes.unwrap_or(current.notes),
                    },
                )
                .context("Could not update the contact")?;
            println!("Contact updated");
        }
        ContactCommand::Delete { id } => {
            store
                .delete_by_id::<Contact>(&id)
                .context("Could not delete the contact")?;
            println!("Contact deleted");
        }
    }
    Ok(())
}

fn run_appointment(store: &Store, cmd: AppointmentCommand) -> Result<()> {
    match cmd {
        AppointmentCommand::Add {
            date,
            start,
            end,
            subjects,
            address,
            notes,
        } => {
            let appointment = store
                .create_appointment(NewAppointment {
                    date: date_or_today(date)?.to_string(),
                    start,
                    end,
                    subjects,
                    address,
                    notes,
                })
                .context("Could not save the appointment")?;
            println!("Appointment saved ({}) on {}", appointment.id, appointment.date);
        }
        AppointmentCommand::List { date } => {
            let appointments: Vec<Appointment> = match date {
                Some(d) => store.filter_or_empty(&d).context("Could not load appointments")?,
                None => store.list_or_empty().context("Could not load appointments")?,
            };
            if appointments.is_empty() {
                println!("No appointments.");
            }
            for appointment in &appointments {
                print_appointment(appointment, true);
            }
        }
        AppointmentCommand::Edit {
            id,
            date,
            start,
            end,
            subjects,
            address,
            notes,
        } => {
            let current: Appointment = store
                .get(&id)
                .context("Could not load appointments")?
                .ok_or_else(|| eyre!("No appointment with id {}", id))?;
            store
                .edit_appointment(
                    &id,
                    NewAppointment {
                        date: date.unwrap_or(current.date),
                        start: start.unwrap_or(current.start),
                        end: end.unwrap_or(current.end),
                        subjects: if subjects.is_empty() { current.subjects } else { subjects },
                        address: address.unwrap_or(current.address),
                        notes: notes.unwrap_or(current.notes),
                    },
                )
                .context("Could not update the appointment")?;
            println!("Appointment updated");
        }
        AppointmentCommand::Delete { id } => {
            store
                .delete_by_id::<Appointment>(&id)
                .context("Could not delete the appointment")?;
            println!("Appointment deleted");
        }
    }
    Ok(())
}

fn run_task(store: &Store, cmd: TaskCommand) -> Result<()> {
    match cmd {
        TaskCommand::Add {
            date,
            description,
            notes,
        } => {
            let task = store
                .create_task(NewTask {
                    date: date_or_today(date)?.to_string(),
                    description,
                    notes,
                })
                .context("Could not save the task")?;
            println!("Task saved ({}) due {}", task.id, task.date);
        }
        TaskCommand::List { date } => {
            let tasks: Vec<Task> = match date {
                Some(d) => store.filter_or_empty(&d).context("Could not load tasks")?,
                None => store.list_or_empty().context("Could not load tasks")?,
            };
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in &tasks {
                print_task(task, true);
            }
        }
        TaskCommand::Edit {
            id,
            date,
            description,
            notes,
        } => {
            let current: Task = store
                .get(&id)
                .context("Could not load tasks")?
                .ok_or_else(|| eyre!("No task with id {}", id))?;
            store
                .edit_task(
                    &id,
                    NewTask {
                        date: date.unwrap_or(current.date),
                        description: description.unwrap_or(current.description),
                        notes: notes.unwrap_or(current.notes),
                    },
                )
                .context("Could not update the task")?;
            println!("Task updated");
        }
        TaskCommand::Done { id } => {
            store.set_task_finished(&id, true).context("Could not update the task")?;
            println!("Task marked as done");
        }
        TaskCommand::Undo { id } => {
            store.set_task_finished(&id, false).context("Could not update the task")?;
            println!("Task marked as pending");
        }
        TaskCommand::Delete { id } => {
            store
                .delete_by_id::<Task>(&id)
                .context("Could not delete the task")?;
            println!("Task deleted");
        }
    }
    Ok(())
}

fn print_day(day: &DayView) {
    println!("{}", day.date.to_string().bold());

    println!("  Appointments");
    if day.appointments.is_empty() {
        println!("    (none)");
    }
    for appointment in &day.appointments {
        print_appointment(appointment, false);
    }

    println!("  Tasks");
    if day.tasks.is_empty() {
        println!("    (none)");
    }
    for task in &day.tasks {
        print_task(task, false);
    }
}

fn print_appointment(appointment: &Appointment, with_date: bool) {
    let date = if with_date { format!("{} ", appointment.date) } else { String::new() };
    println!(
        "    [{}] {}{}  {}  {}",
        appointment.id,
        date,
        appointment.time_span(),
        appointment.subjects.join(", "),
        appointment.address.dimmed()
    );
    if !appointment.notes.is_empty() {
        println!("        {}", appointment.notes.dimmed());
    }
}

fn print_task(task: &Task, with_date: bool) {
    let status = if task.finished {
        task.status_label().green()
    } else {
        task.status_label().red()
    };
    let date = if with_date { format!("{} ", task.date) } else { String::new() };
    println!("    [{}] {}{}  {}", task.id, date, task.description, status);
    if !task.notes.is_empty() {
        println!("        {}", task.notes.dimmed());
    }
}
