use crate::utils::config::PLATFORM;

/// Display the event envelope schema
pub fn display_schema(show_details: bool) {
    println!("DevPulse Event Schema");
    println!("Platform: {}", PLATFORM);
    println!();

    if show_details {
        println!("Common fields:");
        println!("  level: string            - \"error\" | \"warning\" | \"info\"");
        println!("  platform: string         - Always \"{}\"", PLATFORM);
        println!("  timestamp: string        - ISO 8601 UTC, millisecond precision");
        println!("  context: object          - Page snapshot at build time");
        println!("    url, userAgent, language: string");
        println!("    viewport, screen: {{ width, height }}");
        println!("  request: object          - {{ url }}");
        println!("  user: object?            - {{ id, email, name }} or null");
        println!();
        println!("Error events add:");
        println!("  exception: object        - {{ type, message, stacktrace }}");
        println!("    stacktrace: array      - {{ function, file, line, column }} or {{ raw }}");
        println!();
        println!("Message events add:");
        println!("  message: string");
        println!();
        println!("Performance events add:");
        println!("  message: string          - \"Performance: <name> = <value><unit>\"");
        println!("  context.performance      - {{ name, value, unit: \"ms\" | \"\" }}");
        println!();
        println!("Captured errors and messages also carry environment and release.");
    } else {
        println!("Use --show for detailed schema information");
    }
}
