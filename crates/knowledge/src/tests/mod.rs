mod pipeline_scenarios;
mod quality_properties;
