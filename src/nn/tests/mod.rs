mod node_parameter;
