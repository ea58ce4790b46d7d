//! Prompt text sent to the generator.

use crate::model::ServiceType;

/// System message paired with every ranking prompt.
pub const SYSTEM_PROMPT: &str = "You are a business research assistant specializing in \
global employment services and software tooling. Provide accurate, verifiable information only.";

/// Render the ranking request for `region` and `service_type`.
///
/// Deterministic: the same inputs always produce the same text.
pub fn build_prompt(region: &str, service_type: ServiceType, count: usize) -> String {
    let label = service_type.label();
    let (entity, entities) = if service_type.is_legacy() {
        ("company", "companies")
    } else {
        ("product", "products")
    };
    let schema = if service_type.is_legacy() {
        r#"[
    {
        "company_name": "Real Company Name",
        "description": "Factual 2-3 sentence description based on their actual services",
        "strengths": ["Real strength 1", "Real strength 2", "Real strength 3"],
        "website": "https://real-company-website.com"
    }
]"#
    } else {
        r#"[
    {
        "tool_name": "Real Product Name",
        "tool_description": "Factual 2-3 sentence description of what the product does",
        "features": ["Real feature 1", "Real feature 2", "Real feature 3"],
        "website_link": "https://real-product-website.com"
    }
]"#
    };

    format!(
        "Generate a ranking of {count} real and verifiable {label} providers that are currently operating in {region}.

Requirements:
1. ONLY include real {entities} that actually exist and provide {label} in {region}
2. Each {entity} MUST have a real, active website
3. All information must be factual and verifiable
4. Focus on well-known, established {entities}
5. Include both global providers operating in {region} and strong local providers
6. Ensure all website URLs are correct, complete (including https://) and active

Research and Ranking Process:
1. Search Phase:
   - Search for \"{label} provider in {region}\" using Google, Bing and LinkedIn
   - From the search results, visit each {entity}'s website in order
   - Identify the first 20 {entities} that actually provide {label} in {region}

2. Scoring Phase:
   - Score each search engine's results by position: 1st = 20 points, 2nd = 19 points, ..., 20th = 1 point
   - Apply these weights to each score:
     * LinkedIn results: 40% weight
     * Google results: 30% weight
     * Bing results: 30% weight
   - Sum the weighted scores from all search engines to get each {entity}'s final score

3. Verification Phase:
   - Visit each {entity}'s website
   - Verify it actively provides {label} in {region}
   - Confirm the website works and describes the offering
   - Check for recent activity and updates
   - Validate contact information and regional presence

4. Final Ranking:
   - Rank {entities} by final weighted score, highest first
   - Ensure all information is current and accurate
   - Double-check all website URLs are correct and functional

Return ONLY a valid JSON array of exactly {count} entries with exactly this structure, no other text:
{schema}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_prompt_mentions_count_region_and_label() {
        let prompt = build_prompt("japan", ServiceType::Eor, 15);
        assert!(prompt.contains("15"));
        assert!(prompt.contains("japan"));
        assert!(prompt.contains("Employer of Record (EOR)"));
        assert!(prompt.contains("\"company_name\""));
        assert!(prompt.contains("\"website\""));
        assert!(prompt.contains("Return ONLY a valid JSON array"));
    }

    #[test]
    fn payroll_label() {
        let prompt = build_prompt("singapore", ServiceType::Payroll, 7);
        assert!(prompt.contains("7 real and verifiable Payroll providers"));
    }

    #[test]
    fn current_types_use_tool_schema() {
        let prompt = build_prompt("brazil", ServiceType::DevTools, 10);
        assert!(prompt.contains(ServiceType::DevTools.label()));
        assert!(prompt.contains("\"tool_name\""));
        assert!(prompt.contains("\"features\""));
        assert!(!prompt.contains("\"company_name\""));
    }

    #[test]
    fn every_variant_carries_weighted_scoring() {
        for service_type in ServiceType::ALL {
            let prompt = build_prompt("japan", service_type, 15);
            assert!(prompt.contains("Google, Bing and LinkedIn"));
            assert!(prompt.contains("first 20"));
            assert!(prompt.contains("1st = 20 points"));
            assert!(prompt.contains("20th = 1 point"));
            assert!(prompt.contains("LinkedIn results: 40% weight"));
            assert!(prompt.contains("Google results: 30% weight"));
            assert!(prompt.contains("Bing results: 30% weight"));
            assert!(prompt.contains("Verification Phase"));
            assert!(prompt.contains("final weighted score"));
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(
            build_prompt("usa", ServiceType::ProductivityApps, 15),
            build_prompt("usa", ServiceType::ProductivityApps, 15)
        );
    }
}
