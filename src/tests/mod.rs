mod partition_properties;
mod recompression_properties;
