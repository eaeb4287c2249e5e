use crate::infra::{InMemoryApplicationStore, InMemoryJobCatalog, InMemoryStatusNotifier};
use agrochamba::error::AppError;
use agrochamba::marketplace::applications::{
    ApplicationService, ApplicationStatus, ApplicationView, UserId,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of workers applying to the demo listing (1-5)
    #[arg(long, default_value_t = 3)]
    pub(crate) applicants: u8,
}

/// Console walkthrough of the application pipeline against the in-memory
/// adapters: apply, auto-view on the owner's first read, advance one
/// applicant to accepted, reject one, cancel one.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let applicants = args.applicants.clamp(1, 5) as u64;

    let store = Arc::new(InMemoryApplicationStore::default());
    let catalog = Arc::new(InMemoryJobCatalog::default());
    let notifier = Arc::new(InMemoryStatusNotifier::default());
    let service = ApplicationService::new(store, catalog.clone(), notifier.clone());

    let owner = UserId(1);
    let job_id = catalog.create_job(owner);
    println!("AgroChamba application workflow demo");
    println!("Listing {} registered for owner {}", job_id, owner);

    let workers: Vec<UserId> = (0..applicants).map(|n| UserId(100 + n)).collect();
    for worker in &workers {
        match service.apply(*worker, job_id, format!("postulación del usuario {worker}")) {
            Ok(application) => println!(
                "- Worker {} applied -> status {}",
                worker,
                application.status.label()
            ),
            Err(err) => println!("- Worker {} rejected at intake: {}", worker, err),
        }
    }

    println!("\nOwner opens the applicant list (pending entries move to viewed)");
    let listed = match service.applicants(owner, job_id) {
        Ok(listed) => listed,
        Err(err) => {
            println!("  Applicant list unavailable: {}", err);
            return Ok(());
        }
    };
    for application in &listed {
        println!(
            "- Worker {}: {} (viewed at {})",
            application.user_id,
            application.status.label(),
            application
                .viewed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        );
    }

    let hired = workers[0];
    println!("\nAdvancing worker {} through the pipeline", hired);
    for next in [
        ApplicationStatus::InProcess,
        ApplicationStatus::Interview,
        ApplicationStatus::Finalist,
        ApplicationStatus::Accepted,
    ] {
        match service.update_status(owner, job_id, hired, next) {
            Ok(application) => println!("- {}", application.status.label()),
            Err(err) => {
                println!("- pipeline stopped: {}", err);
                break;
            }
        }
    }

    if let Some(rejected) = workers.get(1) {
        match service.update_status(owner, job_id, *rejected, ApplicationStatus::Rejected) {
            Ok(_) => println!("Worker {} rejected", rejected),
            Err(err) => println!("Could not reject worker {}: {}", rejected, err),
        }
    }

    if let Some(withdrawn) = workers.get(2) {
        match service.cancel(*withdrawn, job_id) {
            Ok(_) => println!("Worker {} withdrew their application", withdrawn),
            Err(err) => println!("Worker {} could not withdraw: {}", withdrawn, err),
        }
    }

    println!("\nFinal status payloads");
    for worker in &workers {
        match service.status_of(*worker, job_id) {
            Ok(application) => {
                let view = ApplicationView::from_application(&application);
                match serde_json::to_string_pretty(&view) {
                    Ok(json) => println!("{}", json),
                    Err(err) => println!("payload unavailable for {}: {}", worker, err),
                }
            }
            Err(err) => println!("no application for {}: {}", worker, err),
        }
    }

    let events = notifier.events();
    if events.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications");
        for event in events {
            println!(
                "- template={} recipient={} job={} applicant={} status={}",
                event.template,
                event.recipient,
                event.job_id,
                event.applicant,
                event.status.label()
            );
        }
    }

    Ok(())
}
