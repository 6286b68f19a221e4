use colored::Colorize;
use declarative::{LogEvents, Resource, ResourceEvents};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// `1 resource`, `2 resources`
pub fn plural(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

// ============================================================================
// Console notifications
// ============================================================================

/// Prints convergence steps; lifecycle and load events go to the log
pub struct ConsoleEvents {
    pub verbose: bool,
}

impl ResourceEvents for ConsoleEvents {
    fn created(&self, resource: &Resource) {
        LogEvents.created(resource);
    }

    fn identity_defined(&self, resource: &Resource) {
        LogEvents.identity_defined(resource);
    }

    fn fully_defined(&self, resource: &Resource) {
        LogEvents.fully_defined(resource);
    }

    fn load_started(&self, resource: &Resource) {
        LogEvents.load_started(resource);
    }

    fn load_succeeded(&self, resource: &Resource, exists: bool) {
        LogEvents.load_succeeded(resource, exists);
    }

    fn load_failed(&self, resource: &Resource, error: &str) {
        LogEvents.load_failed(resource, error);
    }

    fn update_started(&self, resource: &Resource) {
        LogEvents.update_started(resource);
    }

    fn update_succeeded(&self, resource: &Resource, updated: bool) {
        LogEvents.update_succeeded(resource, updated);
    }

    fn update_failed(&self, resource: &Resource, error: &str) {
        LogEvents.update_failed(resource, error);
    }

    fn action_started(&self, resource: &Resource, description: &[String]) {
        LogEvents.action_started(resource, description);
    }

    fn action_succeeded(&self, resource: &Resource, description: &[String], _updated: bool) {
        let header = description.first().map_or("", String::as_str);
        println!("  {} {} {}", "✓".green(), resource, header.dimmed());
        if self.verbose {
            for line in description.iter().skip(1) {
                println!("      {}", line.dimmed());
            }
        }
    }

    fn action_failed(&self, resource: &Resource, _description: &[String], error: &str) {
        println!("  {} {} - {}", "✗".red(), resource, error.red());
    }

    fn action_skipped(&self, resource: &Resource, reason: &str) {
        if self.verbose {
            println!("  {} {} {}", "·".dimmed(), resource, reason.dimmed());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
